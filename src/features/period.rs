use crate::array_stats::argmax;
use crate::context::MULTIBAND_PERIOD_FIELD;
use crate::data::TimeSeries;
use crate::evaluator::*;
use crate::periodogram::{DynamicFreqGridParams, NyquistFreq, Periodogram};
use crate::types::ObjectId;

use log::{error, info};
use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;

macro_const! {
    const DOC: &str = r#"
Multi-band Lomb-Scargle period

Periodograms of every configured band are computed on a common frequency grid derived from all the
observation times of the object. The multi-band power is the sum of per-band normalised powers
weighted by the number of observations in the band. The best period of every band and of the
multi-band periodogram are reported, as well as their absolute differences.

Bands having less than `min_band_length` valid observations do not contribute to the multi-band
periodogram and their features are missing. The whole row is missing if no band contributes.

This extractor publishes its output table into the shared context under the `period` key, the
`Multiband_period` column is used by period-dependent extractors.

- Depends on: **time**, **band**, **magnitude**
- Minimum number of observations: **`min_band_length`** in at least one band
- Number of features: **$1 + 2 N_\mathrm{bands}$**
"#;
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "PeriodExtractorParameters", into = "PeriodExtractorParameters")]
pub struct PeriodExtractor {
    bands: BandSet,
    freq_grid: DynamicFreqGridParams,
    min_band_length: usize,
    properties: Box<EvaluatorProperties>,
}

impl PeriodExtractor {
    pub fn new(bands: BandSet, freq_grid: DynamicFreqGridParams, min_band_length: usize) -> Self {
        assert!(!bands.is_empty(), "at least one band is required");
        assert!(min_band_length >= 2, "min_band_length must be at least 2");
        let mut names = vec![MULTIBAND_PERIOD_FIELD.to_owned()];
        let mut descriptions = vec!["period of the multi-band periodogram maximum".to_owned()];
        for band in bands.iter() {
            names.push(format!("Period_band_{band}"));
            descriptions.push(format!("period of the periodogram maximum, band {band}"));
            names.push(format!("delta_period_{band}"));
            descriptions.push(format!(
                "absolute difference of the multi-band period and the period of band {band}"
            ));
        }
        Self {
            properties: EvaluatorProperties {
                names,
                descriptions,
                required_columns: [Column::Mjd, Column::Fid, Column::MagpsfMl].into(),
            }
            .into(),
            bands,
            freq_grid,
            min_band_length,
        }
    }

    #[inline]
    pub fn default_bands() -> BandSet {
        [Band(1), Band(2)].into()
    }

    #[inline]
    pub fn default_freq_grid() -> DynamicFreqGridParams {
        DynamicFreqGridParams::new(10.0, 1.0, NyquistFreq::average(), 1 << 20)
    }

    #[inline]
    pub fn default_min_band_length() -> usize {
        5
    }

    pub fn bands(&self) -> &BandSet {
        &self.bands
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    fn band_time_series<T: Float>(
        &self,
        lc: &ObjectLightCurve<T>,
    ) -> Vec<Option<TimeSeries<'static, T>>> {
        self.bands
            .iter()
            .map(|&band| {
                lc.select(band, &[Column::MagpsfMl])
                    .filter(|selection| selection.len() >= self.min_band_length)
                    .map(|selection| {
                        let n = selection.len();
                        let m = selection.values.into_iter().next().unwrap_or_default();
                        TimeSeries::new(selection.t, m, Array1::<T>::ones(n))
                    })
            })
            .collect()
    }

    /// Feature vector of a single object, see [PeriodExtractor] for details
    pub fn eval_object<T: Float>(&self, lc: &ObjectLightCurve<T>) -> Result<Vec<T>, EvaluatorError> {
        let mut band_ts = self.band_time_series(lc);

        let mut t_all: Vec<T> = band_ts
            .iter()
            .flatten()
            .flat_map(|ts| ts.t.sample.iter().copied())
            .collect();
        if t_all.is_empty() {
            let longest = self
                .bands
                .iter()
                .map(|&band| lc.band_len(band))
                .max()
                .unwrap_or(0);
            return Err(EvaluatorError::ShortTimeSeries {
                actual: longest,
                minimum: self.min_band_length,
            });
        }
        // Selected times are finite
        t_all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let periodogram =
            Periodogram::from_t(&t_all, &self.freq_grid).ok_or(EvaluatorError::ZeroDuration)?;

        let mut multiband_power: Array1<T> = Array1::zeros(periodogram.freq_grid().size());
        let mut band_periods = Vec::with_capacity(band_ts.len());
        for ts in band_ts.iter_mut() {
            let period = match ts {
                Some(ts) => {
                    let power = Array1::from(periodogram.power(ts));
                    multiband_power.scaled_add(ts.lenf(), &power);
                    peak_period(&periodogram, power.view())
                }
                None => T::nan(),
            };
            band_periods.push(period);
        }
        // Division by the total number of observations does not move the maximum
        let multiband_period = peak_period(&periodogram, multiband_power.view());

        let mut output = Vec::with_capacity(1 + 2 * band_periods.len());
        output.push(multiband_period);
        for period in band_periods {
            output.push(period);
            output.push(T::abs(multiband_period - period));
        }
        Ok(output)
    }
}

fn peak_period<T: Float>(periodogram: &Periodogram<T>, power: ArrayView1<T>) -> T {
    match argmax(power) {
        Some(i) => periodogram.period(i),
        None => T::nan(),
    }
}

impl Default for PeriodExtractor {
    fn default() -> Self {
        Self::new(
            Self::default_bands(),
            Self::default_freq_grid(),
            Self::default_min_band_length(),
        )
    }
}

impl FeatureNamesDescriptionsTrait for PeriodExtractor {
    properties_names_descriptions!();
}

impl RequiredColumnsTrait for PeriodExtractor {
    fn required_columns(&self) -> &ColumnSet {
        &self.properties.required_columns
    }
}

impl ContextRoleTrait for PeriodExtractor {
    fn context_role(&self) -> ContextRole {
        ContextRole::producer(ContextKey::Period)
    }
}

impl<T> FeatureExtractorTrait<T> for PeriodExtractor
where
    T: Float,
{
    fn compute_no_check(
        &self,
        table: &LightCurveTable<T>,
        _ctx: &SharedContext<T>,
    ) -> FeatureTable<T> {
        let size = FeatureExtractorTrait::<T>::size_hint(self);
        let rows: Vec<(ObjectId, Vec<T>)> = table
            .objects()
            .par_iter()
            .map(|(oid, lc)| {
                let values = match self.eval_object(lc) {
                    Ok(values) => values,
                    Err(err @ EvaluatorError::ShortTimeSeries { .. }) => {
                        info!("Period features of object {oid} are missing: {err}");
                        vec![T::nan(); size]
                    }
                    Err(err) => {
                        error!("Period features of object {oid} cannot be computed: {err}");
                        vec![T::nan(); size]
                    }
                };
                (oid.clone(), values)
            })
            .collect();
        FeatureTable::from_rows(self.properties.names.clone(), rows)
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "PeriodExtractor")]
struct PeriodExtractorParameters {
    bands: BandSet,
    freq_grid: DynamicFreqGridParams,
    min_band_length: usize,
}

impl From<PeriodExtractor> for PeriodExtractorParameters {
    fn from(f: PeriodExtractor) -> Self {
        Self {
            bands: f.bands,
            freq_grid: f.freq_grid,
            min_band_length: f.min_band_length,
        }
    }
}

impl From<PeriodExtractorParameters> for PeriodExtractor {
    fn from(p: PeriodExtractorParameters) -> Self {
        Self::new(p.bands, p.freq_grid, p.min_band_length)
    }
}

impl JsonSchema for PeriodExtractor {
    json_schema!(PeriodExtractorParameters, false);
}
