#![doc = include_str!("../README.md")]


#[macro_use]
mod macros;

mod array_stats;

mod bandwise;
pub use bandwise::BandwiseExtractor;

mod context;
pub use context::{ContextKey, ContextRole, MULTIBAND_PERIOD_FIELD, SharedContext};

mod data;
pub use data::{
    Band, BandSelection, Column, ColumnSet, DataSample, LightCurveTable, ObjectLightCurve,
    TimeSeries,
};

mod error;
pub use error::{
    ConfigError, ContextError, CurveFitError, EvaluatorError, SchemaError, TableError,
};

mod evaluator;
pub use evaluator::{
    BandFeatureEvaluator, BandSet, ContextRoleTrait, EvaluatorProperties, FeatureExtractorTrait,
    FeatureNamesDescriptionsTrait, FeatureRow, MissingReason, RequiredColumnsTrait,
};

mod extractor;
pub use extractor::Extractor;

mod feature_table;
pub use feature_table::FeatureTable;

pub mod features;
pub use features::*;

mod float_trait;
pub use float_trait::Float;

pub mod nl_fit;
pub use nl_fit::{CobylaCurveFit, CurveFitAlgorithm, LmCurveFit};

mod orchestrator;
pub use orchestrator::{FeatureBatch, FeatureOrchestrator};

#[doc(hidden)]
pub mod periodogram;
pub use periodogram::{
    AverageNyquistFreq, DynamicFreqGridParams, FixedNyquistFreq, MedianNyquistFreq, NyquistFreq,
};

mod types;
pub use types::ObjectId;

pub use ndarray;
