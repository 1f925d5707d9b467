use crate::lc_data::{PeriodicRecord, records_from_reader, table_from_reader, test_data_file};

use lazy_static::lazy_static;
use light_curve_classifier_features::{Float, LightCurveTable};
use serde::Deserialize;

/// Multi-harmonic variable stars observed in bands 1 and 2, magnitudes are in "ML" columns
pub fn periodic_table<T>() -> LightCurveTable<T>
where
    T: Float,
{
    table_from_reader::<T, _, PeriodicRecord>(test_data_file("periodic.csv")).unwrap()
}

#[derive(Deserialize)]
struct PeriodRecord {
    oid: String,
    period: f64,
}

lazy_static! {
    pub static ref PERIODIC_TABLE_F64: LightCurveTable<f64> = periodic_table();

    /// True periods of [PERIODIC_TABLE_F64] objects
    pub static ref PERIODIC_PERIODS: Vec<(String, f64)> =
        records_from_reader::<_, PeriodRecord>(test_data_file("periodic_truth.csv"))
            .unwrap()
            .into_iter()
            .map(|record| (record.oid, record.period))
            .collect();
}
