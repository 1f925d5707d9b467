use crate::context::ContextKey;
use crate::data::Column;

use std::collections::BTreeSet;

/// Error returned from [crate::FeatureExtractorTrait::validate]
///
/// It is a configuration error: the whole extractor contribution is discarded
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required columns {missing:?} are absent, the table has {available:?}")]
    MissingColumns {
        missing: BTreeSet<Column>,
        available: BTreeSet<Column>,
    },
}

/// Error returned from [crate::LightCurveTable] constructors
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("column {column} has length {actual}, but {expected} rows are expected")]
    LengthMismatch {
        column: Column,
        actual: usize,
        expected: usize,
    },

    #[error("column {0} is given more than once")]
    DuplicateColumn(Column),

    #[error("column {0} cannot be a value column")]
    NotValueColumn(Column),
}

/// Per-object, per-band evaluation error
///
/// It never leaves the object loop, the driver converts it to a missing row
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("time-series' length {actual} is smaller than the minimum required length {minimum}")]
    ShortTimeSeries { actual: usize, minimum: usize },

    #[error("fit has not converged: {0}")]
    FitNonConvergence(#[from] CurveFitError),

    #[error("period is not available: {0}")]
    PeriodUnavailable(#[from] ContextError),

    #[error("period must be a positive finite number, found {0}")]
    NonFinitePeriod(f64),

    #[error("observations span zero time, no frequency grid can be built")]
    ZeroDuration,

    #[error("arrays have different lengths: time {t}, values {values}, errors {errors}")]
    ArrayLengthMismatch {
        t: usize,
        values: usize,
        errors: usize,
    },
}

/// Error returned from [crate::nl_fit::CurveFitTrait::curve_fit] and the linear harmonic fit
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CurveFitError {
    #[error("initial guess or bounds are infeasible")]
    InfeasibleBounds,

    #[error("residuals are not finite")]
    NonFiniteResidual,

    #[error("iteration limit {0} is exceeded")]
    IterationLimit(usize),

    #[error("optimizer stopped by round-off errors")]
    RoundoffLimited,

    #[error("singular value decomposition has not converged")]
    SvdNonConvergence,
}

/// Error returned from [crate::SharedContext] lookups
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context has no {0} table")]
    MissingKey(ContextKey),

    #[error("context {key} table has no {object} object")]
    MissingObject { key: ContextKey, object: String },

    #[error("context {key} table has no {field} field")]
    MissingField { key: ContextKey, field: String },
}

/// Error returned from configuration (de)serialization
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot (de)serialize configuration: {0}")]
    Json(#[from] serde_json::Error),
}
