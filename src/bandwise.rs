use crate::evaluator::*;
use crate::types::ObjectId;

use itertools::Itertools;
use rayon::prelude::*;
use std::marker::PhantomData;

/// Band-aware extractor evaluating a single-band feature for every configured band
///
/// Output names are band-major: all the feature names suffixed with the first band, then with the
/// second one, etc. Every object of the input table gets a row, bands without detections give NaN
/// values.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(
    from = "BandwiseParameters<F>",
    into = "BandwiseParameters<F>",
    bound = "T: Float, F: BandFeatureEvaluator<T> + Serialize + for<'a> Deserialize<'a>"
)]
pub struct BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    feature: F,
    bands: BandSet,
    properties: Box<EvaluatorProperties>,
    phantom: PhantomData<T>,
}

impl<T, F> BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    /// Creates a new instance of [BandwiseExtractor]
    ///
    /// # Arguments
    /// - `feature` - single-band feature to evaluate for each band
    /// - `bands` - bands to evaluate the feature for
    pub fn new(feature: F, bands: BandSet) -> Self {
        let names = bands
            .iter()
            .flat_map(|&band| feature.names_for_band(band))
            .collect();
        let descriptions = bands
            .iter()
            .flat_map(|&band| feature.descriptions_for_band(band))
            .collect();
        Self {
            properties: EvaluatorProperties {
                names,
                descriptions,
                required_columns: feature.required_columns().clone(),
            }
            .into(),
            feature,
            bands,
            phantom: PhantomData,
        }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    pub fn bands(&self) -> &BandSet {
        &self.bands
    }
}

impl<T, F> FeatureNamesDescriptionsTrait for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    properties_names_descriptions!();
}

impl<T, F> RequiredColumnsTrait for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    fn required_columns(&self) -> &ColumnSet {
        &self.properties.required_columns
    }
}

impl<T, F> ContextRoleTrait for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    fn context_role(&self) -> ContextRole {
        self.feature.context_role()
    }
}

impl<T, F> FeatureExtractorTrait<T> for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T> + Serialize + for<'a> Deserialize<'a>,
{
    fn compute_no_check(
        &self,
        table: &LightCurveTable<T>,
        ctx: &SharedContext<T>,
    ) -> FeatureTable<T> {
        let ctx = self.feature.prepare_context(table, ctx);
        let band_size = self.feature.size_hint();
        let rows: Vec<(ObjectId, Vec<T>)> = table
            .objects()
            .par_iter()
            .map(|(oid, lc)| {
                let values = self
                    .bands
                    .iter()
                    .flat_map(|&band| {
                        self.feature
                            .compute_for_band(oid, lc, band, &ctx)
                            .into_values(band_size)
                    })
                    .collect_vec();
                (oid.clone(), values)
            })
            .collect();
        FeatureTable::from_rows(self.properties.names.clone(), rows)
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Bandwise")]
struct BandwiseParameters<F> {
    feature: F,
    bands: BandSet,
}

impl<T, F> From<BandwiseExtractor<T, F>> for BandwiseParameters<F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    fn from(f: BandwiseExtractor<T, F>) -> Self {
        Self {
            feature: f.feature,
            bands: f.bands,
        }
    }
}

impl<T, F> From<BandwiseParameters<F>> for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T>,
{
    fn from(p: BandwiseParameters<F>) -> Self {
        Self::new(p.feature, p.bands)
    }
}

impl<T, F> JsonSchema for BandwiseExtractor<T, F>
where
    T: Float,
    F: BandFeatureEvaluator<T> + JsonSchema,
{
    json_schema!(BandwiseParameters<F>, false);
}
