pub use crate::context::{ContextKey, ContextRole, SharedContext};
pub use crate::data::{Band, Column, ColumnSet, LightCurveTable, ObjectLightCurve};
pub use crate::error::{EvaluatorError, SchemaError};
pub use crate::feature_table::FeatureTable;
pub use crate::float_trait::Float;

use enum_dispatch::enum_dispatch;
use log::{error, info};
pub use schemars::JsonSchema;
pub use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Static declarations of an extractor, derived once at construction
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatorProperties {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub required_columns: ColumnSet,
}

#[enum_dispatch]
pub trait FeatureNamesDescriptionsTrait {
    /// Vector of feature names. The length and feature order corresponds to
    /// [FeatureExtractorTrait::compute] output columns
    fn get_names(&self) -> Vec<&str>;

    /// Vector of feature descriptions. The length and feature order corresponds to
    /// [FeatureExtractorTrait::compute] output columns
    fn get_descriptions(&self) -> Vec<&str>;
}

#[enum_dispatch]
pub trait RequiredColumnsTrait {
    /// Columns which must be present in a [LightCurveTable]
    fn required_columns(&self) -> &ColumnSet;
}

#[enum_dispatch]
pub trait ContextRoleTrait {
    fn context_role(&self) -> ContextRole;
}

/// The trait each object-level extractor should implement
#[enum_dispatch]
pub trait FeatureExtractorTrait<T: Float>:
    FeatureNamesDescriptionsTrait + RequiredColumnsTrait + ContextRoleTrait + Clone + Debug + Serialize
{
    /// Size of the feature vector of every object
    fn size_hint(&self) -> usize {
        self.get_names().len()
    }

    /// Check that the table carries every required column
    fn validate(&self, table: &LightCurveTable<T>) -> Result<(), SchemaError> {
        check_columns(self.required_columns(), table.columns())
    }

    /// Version of [FeatureExtractorTrait::compute] without [FeatureExtractorTrait::validate]
    fn compute_no_check(&self, table: &LightCurveTable<T>, ctx: &SharedContext<T>)
    -> FeatureTable<T>;

    /// Table with a single row for every object of the input table
    fn compute(
        &self,
        table: &LightCurveTable<T>,
        ctx: &SharedContext<T>,
    ) -> Result<FeatureTable<T>, SchemaError> {
        self.validate(table)?;
        Ok(self.compute_no_check(table, ctx))
    }
}

pub(crate) fn check_columns(
    required: &ColumnSet,
    available: &ColumnSet,
) -> Result<(), SchemaError> {
    let missing: ColumnSet = required.difference(available).copied().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns {
            missing,
            available: available.clone(),
        })
    }
}

pub(crate) fn check_lengths(t: usize, values: usize, errors: usize) -> Result<(), EvaluatorError> {
    if t == values && t == errors {
        Ok(())
    } else {
        Err(EvaluatorError::ArrayLengthMismatch { t, values, errors })
    }
}

/// Why a [FeatureRow] has no values
#[derive(Clone, Debug, PartialEq)]
pub enum MissingReason {
    NoDetectionsInBand,
    Failed(EvaluatorError),
}

/// Per-object, per-band outcome
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureRow<T> {
    Values(Vec<T>),
    Missing(MissingReason),
}

impl<T> FeatureRow<T>
where
    T: Float,
{
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureRow::Missing(_))
    }

    /// Feature values, missing row is replaced with `size` NaN
    pub fn into_values(self, size: usize) -> Vec<T> {
        match self {
            FeatureRow::Values(v) => v,
            FeatureRow::Missing(_) => vec![T::nan(); size],
        }
    }
}

/// The trait each single-band feature should implement
///
/// [crate::BandwiseExtractor] turns it into a [FeatureExtractorTrait] by evaluating it for every
/// configured band of every object.
pub trait BandFeatureEvaluator<T>:
    FeatureNamesDescriptionsTrait + RequiredColumnsTrait + ContextRoleTrait + Clone + Debug + Send + Sync
where
    T: Float,
{
    fn size_hint(&self) -> usize {
        self.get_names().len()
    }

    /// Feature names suffixed with the band
    fn names_for_band(&self, band: Band) -> Vec<String> {
        self.get_names()
            .into_iter()
            .map(|name| band.suffixed(name))
            .collect()
    }

    fn descriptions_for_band(&self, band: Band) -> Vec<String> {
        self.get_descriptions()
            .into_iter()
            .map(|description| format!("{description}, band {band}"))
            .collect()
    }

    /// Called once per batch before evaluating objects
    ///
    /// Consumers may use it to fill a missing context entry
    fn prepare_context<'c>(
        &self,
        _table: &LightCurveTable<T>,
        ctx: &'c SharedContext<T>,
    ) -> Cow<'c, SharedContext<T>> {
        Cow::Borrowed(ctx)
    }

    /// Feature values of a band the object has detections in
    fn eval_band(
        &self,
        oid: &str,
        lc: &ObjectLightCurve<T>,
        band: Band,
        ctx: &SharedContext<T>,
    ) -> Result<Vec<T>, EvaluatorError>;

    /// Never fails, errors are logged and converted to [FeatureRow::Missing]
    fn compute_for_band(
        &self,
        oid: &str,
        lc: &ObjectLightCurve<T>,
        band: Band,
        ctx: &SharedContext<T>,
    ) -> FeatureRow<T> {
        if !lc.has_band(band) {
            info!(
                "{} features of object {oid} are missing: no detections in band {band}",
                self.feature_family()
            );
            return FeatureRow::Missing(MissingReason::NoDetectionsInBand);
        }
        match self.eval_band(oid, lc, band, ctx) {
            Ok(values) => FeatureRow::Values(values),
            Err(err) => {
                error!(
                    "{} features of object {oid} in band {band} cannot be computed: {err}",
                    self.feature_family()
                );
                FeatureRow::Missing(MissingReason::Failed(err))
            }
        }
    }

    /// Human-readable name used in log messages
    fn feature_family(&self) -> &'static str;
}

/// Bands set used by band-aware extractors
pub type BandSet = BTreeSet<Band>;
