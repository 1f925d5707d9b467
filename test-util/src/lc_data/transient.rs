use crate::lc_data::{TransientRecord, records_from_reader, table_from_reader, test_data_file};

use lazy_static::lazy_static;
use light_curve_classifier_features::{Band, Float, LightCurveTable};
use serde::Deserialize;

/// Supernova-like transients with difference fluxes in bands 1 and 2
///
/// Each light curve is sampled from the parametric supernova model with time counted from the
/// first detection of the band.
pub fn transient_table<T>() -> LightCurveTable<T>
where
    T: Float,
{
    table_from_reader::<T, _, TransientRecord>(test_data_file("transient.csv")).unwrap()
}

/// Model parameters used to generate a band of [TRANSIENT_TABLE_F64]
#[derive(Clone, Debug)]
pub struct TransientParameters {
    pub oid: String,
    pub band: Band,
    /// Amplitude, reference time, plateau duration, plateau slope, rise and fall times
    pub params: [f64; 6],
}

#[derive(Deserialize)]
struct TransientParametersRecord {
    oid: String,
    fid: u8,
    a: f64,
    t0: f64,
    gamma: f64,
    beta: f64,
    tau_rise: f64,
    tau_fall: f64,
}

impl From<TransientParametersRecord> for TransientParameters {
    fn from(r: TransientParametersRecord) -> Self {
        Self {
            oid: r.oid,
            band: Band(r.fid),
            params: [r.a, r.t0, r.gamma, r.beta, r.tau_rise, r.tau_fall],
        }
    }
}

lazy_static! {
    pub static ref TRANSIENT_TABLE_F64: LightCurveTable<f64> = transient_table();

    pub static ref TRANSIENT_PARAMETERS: Vec<TransientParameters> =
        records_from_reader::<_, TransientParametersRecord>(test_data_file("transient_truth.csv"))
            .unwrap()
            .into_iter()
            .map(Into::into)
            .collect();
}
