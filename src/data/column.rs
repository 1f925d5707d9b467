use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Known columns of a detection table
///
/// [Column::Mjd] and [Column::Fid] are mandatory for any [crate::LightCurveTable], all other
/// columns are optional value columns.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Observation time, modified Julian date
    Mjd,
    /// Band (filter) identifier
    Fid,
    /// PSF magnitude
    Magpsf,
    /// PSF magnitude uncertainty
    Sigmapsf,
    /// PSF magnitude corrected for the reference flux, "ML" version
    MagpsfMl,
    /// Uncertainty of [Column::MagpsfMl]
    SigmapsfMl,
    /// Difference-image flux
    DiffFlux,
    /// Uncertainty of [Column::DiffFlux]
    DiffErr,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Mjd,
        Column::Fid,
        Column::Magpsf,
        Column::Sigmapsf,
        Column::MagpsfMl,
        Column::SigmapsfMl,
        Column::DiffFlux,
        Column::DiffErr,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Mjd => "mjd",
            Column::Fid => "fid",
            Column::Magpsf => "magpsf",
            Column::Sigmapsf => "sigmapsf",
            Column::MagpsfMl => "magpsf_ml",
            Column::SigmapsfMl => "sigmapsf_ml",
            Column::DiffFlux => "diff_flux",
            Column::DiffErr => "diff_err",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }

    /// Is it a real-valued column which could be stored with detection values
    pub fn is_value_column(&self) -> bool {
        !matches!(self, Column::Mjd | Column::Fid)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of columns, used both as a table schema and as extractor requirements
pub type ColumnSet = BTreeSet<Column>;
