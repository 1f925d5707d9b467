use crate::error::ConfigError;
use crate::evaluator::*;
use crate::extractor::Extractor;

use log::{debug, error};

/// Result of a [FeatureOrchestrator] run
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureBatch<T> {
    /// One row per input object, one column per feature of every extractor
    pub features: FeatureTable<T>,
    /// Extractors whose required columns are absent from the input, their columns are NaN
    pub schema_errors: Vec<(String, SchemaError)>,
}

/// Batch driver of a list of extractors
///
/// Extractors producing a shared context entry are evaluated first and their output is published
/// into [SharedContext], then all other extractors are evaluated with the populated context.
/// Output columns follow the registration order regardless of the evaluation order.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(
    from = "FeatureOrchestratorParameters<T>",
    into = "FeatureOrchestratorParameters<T>",
    bound = "T: Float"
)]
pub struct FeatureOrchestrator<T>
where
    T: Float,
{
    extractors: Vec<Extractor<T>>,
    #[serde(skip)]
    #[schemars(skip)]
    properties: Box<EvaluatorProperties>,
}

impl<T> FeatureOrchestrator<T>
where
    T: Float,
{
    pub fn new(extractors: Vec<Extractor<T>>) -> Self {
        let properties = EvaluatorProperties {
            names: extractors
                .iter()
                .flat_map(|x| x.get_names())
                .map(String::from)
                .collect(),
            descriptions: extractors
                .iter()
                .flat_map(|x| x.get_descriptions())
                .map(String::from)
                .collect(),
            required_columns: extractors
                .iter()
                .flat_map(|x| x.required_columns().iter().copied())
                .collect(),
        }
        .into();
        Self {
            extractors,
            properties,
        }
    }

    pub fn extractors(&self) -> &[Extractor<T>] {
        &self.extractors
    }

    /// Deserialize from JSON configuration
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to JSON configuration
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Evaluate all extractors with a new empty context
    pub fn run(&self, table: &LightCurveTable<T>) -> FeatureBatch<T> {
        self.run_with_context(table, SharedContext::new())
    }

    /// Evaluate all extractors with an initial context
    ///
    /// Entries published by producers replace the entries of the initial context.
    pub fn run_with_context(
        &self,
        table: &LightCurveTable<T>,
        mut ctx: SharedContext<T>,
    ) -> FeatureBatch<T> {
        let mut outputs: Vec<Option<FeatureTable<T>>> = vec![None; self.extractors.len()];
        let mut schema_errors = vec![];

        for (output, extractor) in outputs.iter_mut().zip(self.extractors.iter()) {
            let Some(key) = extractor.context_role().produces else {
                continue;
            };
            match Self::compute(extractor, table, &ctx) {
                Ok(features) => {
                    ctx.publish(key, features.clone());
                    *output = Some(features);
                }
                Err(err) => schema_errors.push((extractor.name().to_owned(), err)),
            }
        }

        for (output, extractor) in outputs.iter_mut().zip(self.extractors.iter()) {
            if extractor.context_role().is_producer() {
                continue;
            }
            match Self::compute(extractor, table, &ctx) {
                Ok(features) => *output = Some(features),
                Err(err) => schema_errors.push((extractor.name().to_owned(), err)),
            }
        }

        let features = outputs.into_iter().zip(self.extractors.iter()).fold(
            FeatureTable::from_index(table.object_ids()),
            |acc, (output, extractor)| {
                let features = output.unwrap_or_else(|| {
                    let names = extractor.get_names().into_iter().map(String::from).collect();
                    FeatureTable::filled(names, table.object_ids(), T::nan())
                });
                acc.hstack(features)
            },
        );
        FeatureBatch {
            features,
            schema_errors,
        }
    }

    fn compute(
        extractor: &Extractor<T>,
        table: &LightCurveTable<T>,
        ctx: &SharedContext<T>,
    ) -> Result<FeatureTable<T>, SchemaError> {
        debug!(
            "Evaluating {} extractor for {} objects",
            extractor.name(),
            table.len()
        );
        extractor.compute(table, ctx).inspect_err(|err| {
            error!(
                "{} extractor is skipped, its features are missing: {err}",
                extractor.name()
            )
        })
    }
}

impl<T> FeatureNamesDescriptionsTrait for FeatureOrchestrator<T>
where
    T: Float,
{
    properties_names_descriptions!();
}

impl<T> RequiredColumnsTrait for FeatureOrchestrator<T>
where
    T: Float,
{
    /// Union of the columns required by all extractors
    fn required_columns(&self) -> &ColumnSet {
        &self.properties.required_columns
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "FeatureOrchestrator", bound = "T: Float")]
struct FeatureOrchestratorParameters<T>
where
    T: Float,
{
    extractors: Vec<Extractor<T>>,
}

impl<T> From<FeatureOrchestrator<T>> for FeatureOrchestratorParameters<T>
where
    T: Float,
{
    fn from(f: FeatureOrchestrator<T>) -> Self {
        Self {
            extractors: f.extractors,
        }
    }
}

impl<T> From<FeatureOrchestratorParameters<T>> for FeatureOrchestrator<T>
where
    T: Float,
{
    fn from(p: FeatureOrchestratorParameters<T>) -> Self {
        Self::new(p.extractors)
    }
}
