use light_curve_classifier_features::{Band, Column};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Single detection of a long-format CSV file
pub(super) trait DetectionRecord: DeserializeOwned {
    /// Value columns in the order of [DetectionRecord::into_row] output
    fn value_columns() -> &'static [Column];

    fn into_row(self) -> (String, f64, Band, Vec<f64>);
}

#[derive(Deserialize)]
pub(super) struct PeriodicRecord {
    oid: String,
    mjd: f64,
    fid: u8,
    magpsf_ml: f64,
    sigmapsf_ml: f64,
}

impl DetectionRecord for PeriodicRecord {
    fn value_columns() -> &'static [Column] {
        &[Column::MagpsfMl, Column::SigmapsfMl]
    }

    fn into_row(self) -> (String, f64, Band, Vec<f64>) {
        (
            self.oid,
            self.mjd,
            Band(self.fid),
            vec![self.magpsf_ml, self.sigmapsf_ml],
        )
    }
}

#[derive(Deserialize)]
pub(super) struct TransientRecord {
    oid: String,
    mjd: f64,
    fid: u8,
    diff_flux: f64,
    diff_err: f64,
}

impl DetectionRecord for TransientRecord {
    fn value_columns() -> &'static [Column] {
        &[Column::DiffFlux, Column::DiffErr]
    }

    fn into_row(self) -> (String, f64, Band, Vec<f64>) {
        (
            self.oid,
            self.mjd,
            Band(self.fid),
            vec![self.diff_flux, self.diff_err],
        )
    }
}
