use crate::bandwise::BandwiseExtractor;
use crate::evaluator::*;
use crate::features::*;

use enum_dispatch::enum_dispatch;

/// All extractors are available as variants of this enum
///
/// Consider to import [crate::FeatureExtractorTrait] as well
#[enum_dispatch(
    FeatureExtractorTrait<T>,
    FeatureNamesDescriptionsTrait,
    RequiredColumnsTrait,
    ContextRoleTrait
)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
#[non_exhaustive]
pub enum Extractor<T>
where
    T: Float,
{
    SnParametricModel(BandwiseExtractor<T, SnParametricModel>),
    Harmonics(BandwiseExtractor<T, Harmonics>),
    Period(PeriodExtractor),
}

impl<T> Extractor<T>
where
    T: Float,
{
    /// [SnParametricModel] evaluated for every band of `bands`
    pub fn sn_parametric_model(feature: SnParametricModel, bands: BandSet) -> Self {
        BandwiseExtractor::new(feature, bands).into()
    }

    /// [Harmonics] evaluated for every band of `bands`
    pub fn harmonics(feature: Harmonics, bands: BandSet) -> Self {
        BandwiseExtractor::new(feature, bands).into()
    }

    pub fn period(feature: PeriodExtractor) -> Self {
        feature.into()
    }

    /// Variant name used in log messages and error reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::SnParametricModel(_) => "SnParametricModel",
            Self::Harmonics(_) => "Harmonics",
            Self::Period(_) => "Period",
        }
    }
}
