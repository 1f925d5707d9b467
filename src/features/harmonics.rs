use crate::array_stats::mean_squared_difference;
use crate::context::MULTIBAND_PERIOD_FIELD;
use crate::data::BandSelection;
use crate::error::CurveFitError;
use crate::evaluator::*;
use crate::features::PeriodExtractor;

use log::info;
use macro_const::macro_const;
use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, ArrayView1};
use std::borrow::Cow;
use std::f64::consts::PI;

/// Relative singular value cutoff of the pseudo-inverse
const RCOND: f64 = 1e-15;
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Reduce the phase to $[0, 2\pi)$
///
/// Remainder of a tiny negative phase rounds up to $2\pi$ exactly, as well as conversion of a
/// phase just below $2\pi$ to a lower precision, both are mapped to zero.
fn wrap_phase<T: Float>(phase: T) -> T {
    let two_pi = T::two() * T::PI();
    let r = phase % two_pi;
    let r = if r < T::zero() { r + two_pi } else { r };
    if r >= two_pi { T::zero() } else { r }
}

macro_const! {
    const DOC: &str = r#"
Harmonic series fit

Weighted linear least squares fit of the truncated Fourier series

$$
m(t) = c_0 + \sum_{k=1}^N \left(a_k \cos k \omega t + b_k \sin k \omega t\right),
\quad \omega = \frac{2\pi}{P},
$$

where the period $P$ is the `Multiband_period` of the object from the shared `period` context. If
the context has no period table, [PeriodExtractor] is evaluated once for the whole batch.
Observation weights are $1 / (\delta_i + 0.01)$, the solution is obtained with the SVD
pseudo-inverse, so it exists for any number of observations.

Features are amplitudes $\sqrt{a_k^2 + b_k^2}$ of all the harmonics, phases
$\phi_k = \mathrm{atan2}(b_k, a_k)$ relative to the first harmonic
$(\phi_k - k \phi_1) \bmod 2\pi$ for $k = 2..N$, and the mean squared difference of the fit and
the data.

- Depends on: **time**, **magnitude**, **magnitude error**, **period**
- Minimum number of observations: **1**
- Number of features: **$2N$**
"#;
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "HarmonicsParameters", into = "HarmonicsParameters")]
pub struct Harmonics {
    n_harmonics: usize,
    error_floor: f64,
    fallback: PeriodExtractor,
    properties: Box<EvaluatorProperties>,
}

impl Harmonics {
    /// New [Harmonics] instance
    ///
    /// `fallback` is used when period is not provided via the shared context.
    pub fn new(n_harmonics: usize, error_floor: f64, fallback: PeriodExtractor) -> Self {
        assert!(n_harmonics > 0, "at least one harmonic is required");
        assert!(
            error_floor.is_finite() && error_floor >= 0.0,
            "error_floor must be non-negative"
        );
        let names = (1..=n_harmonics)
            .map(|k| format!("Harmonics_mag_{k}"))
            .chain((2..=n_harmonics).map(|k| format!("Harmonics_phase_{k}")))
            .chain(std::iter::once("Harmonics_mse".to_owned()))
            .collect();
        let descriptions = (1..=n_harmonics)
            .map(|k| format!("amplitude of harmonic {k}"))
            .chain(
                (2..=n_harmonics).map(|k| format!("phase of harmonic {k} relative to harmonic 1")),
            )
            .chain(std::iter::once(
                "mean squared difference of harmonic fit and magnitudes".to_owned(),
            ))
            .collect();
        Self {
            n_harmonics,
            error_floor,
            fallback,
            properties: EvaluatorProperties {
                names,
                descriptions,
                required_columns: [Column::Mjd, Column::Fid, Column::MagpsfMl, Column::SigmapsfMl]
                    .into(),
            }
            .into(),
        }
    }

    #[inline]
    pub fn default_n_harmonics() -> usize {
        7
    }

    #[inline]
    pub fn default_error_floor() -> f64 {
        0.01
    }

    pub fn n_harmonics(&self) -> usize {
        self.n_harmonics
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    /// Fit the series for given time, magnitude, error arrays and period
    ///
    /// Output order is the same as in [FeatureNamesDescriptionsTrait::get_names]. Relative phases
    /// are in $[0, 2\pi)$.
    pub fn fit(
        &self,
        t: ArrayView1<f64>,
        m: ArrayView1<f64>,
        err: ArrayView1<f64>,
        period: f64,
    ) -> Result<Vec<f64>, EvaluatorError> {
        check_lengths(t.len(), m.len(), err.len())?;
        if !(period.is_finite() && period > 0.0) {
            return Err(EvaluatorError::NonFinitePeriod(period));
        }
        if t.is_empty() {
            return Err(EvaluatorError::ShortTimeSeries {
                actual: 0,
                minimum: 1,
            });
        }
        let n = self.n_harmonics;
        let omega = 2.0 * PI / period;

        let design = DMatrix::from_fn(t.len(), 2 * n + 1, |i, j| match j {
            0 => 1.0,
            j if j <= n => f64::cos(j as f64 * omega * t[i]),
            j => f64::sin((j - n) as f64 * omega * t[i]),
        });
        let weights = DVector::from_iterator(
            err.len(),
            err.iter().map(|&e| (e + self.error_floor).recip()),
        );
        let mut weighted_design = design.clone();
        for (mut row, &w) in weighted_design.row_iter_mut().zip(weights.iter()) {
            row *= w;
        }
        let weighted_m = DVector::from_iterator(
            m.len(),
            m.iter().zip(weights.iter()).map(|(&m, &w)| m * w),
        );

        let svd = SVD::try_new(weighted_design, true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or(CurveFitError::SvdNonConvergence)?;
        let cutoff = RCOND * svd.singular_values.max();
        let coeffs = svd
            .solve(&weighted_m, cutoff)
            .map_err(|_| CurveFitError::SvdNonConvergence)?;
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(CurveFitError::NonFiniteResidual.into());
        }

        let fitted = Array1::from_iter((&design * &coeffs).iter().copied());
        let mse = mean_squared_difference(fitted.view(), m).unwrap_or(f64::NAN);

        let (amplitudes, phases): (Vec<_>, Vec<_>) = (1..=n)
            .map(|k| {
                let (cos, sin) = (coeffs[k], coeffs[k + n]);
                (f64::hypot(cos, sin), f64::atan2(sin, cos))
            })
            .unzip();
        let relative_phases = phases
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &phase)| wrap_phase(phase - (i + 1) as f64 * phases[0]));

        Ok(amplitudes
            .iter()
            .copied()
            .chain(relative_phases)
            .chain(std::iter::once(mse))
            .collect())
    }
}

impl Default for Harmonics {
    fn default() -> Self {
        Self::new(
            Self::default_n_harmonics(),
            Self::default_error_floor(),
            PeriodExtractor::default(),
        )
    }
}

impl FeatureNamesDescriptionsTrait for Harmonics {
    properties_names_descriptions!();
}

impl RequiredColumnsTrait for Harmonics {
    fn required_columns(&self) -> &ColumnSet {
        &self.properties.required_columns
    }
}

impl ContextRoleTrait for Harmonics {
    fn context_role(&self) -> ContextRole {
        ContextRole::consumer(ContextKey::Period)
    }
}

impl<T> BandFeatureEvaluator<T> for Harmonics
where
    T: Float,
{
    fn prepare_context<'c>(
        &self,
        table: &LightCurveTable<T>,
        ctx: &'c SharedContext<T>,
    ) -> Cow<'c, SharedContext<T>> {
        if ctx.contains(ContextKey::Period) {
            return Cow::Borrowed(ctx);
        }
        info!("Harmonics extractor was not provided with period data, computing periodogram");
        let periods = self.fallback.compute_no_check(table, ctx);
        Cow::Owned(ctx.clone().with_table(ContextKey::Period, periods))
    }

    fn eval_band(
        &self,
        oid: &str,
        lc: &ObjectLightCurve<T>,
        band: Band,
        ctx: &SharedContext<T>,
    ) -> Result<Vec<T>, EvaluatorError> {
        let period = ctx
            .lookup(ContextKey::Period, oid, MULTIBAND_PERIOD_FIELD)?
            .value_as_f64();
        let Some(BandSelection { t, values }) =
            lc.select(band, &[Column::MagpsfMl, Column::SigmapsfMl])
        else {
            return Err(EvaluatorError::ShortTimeSeries {
                actual: 0,
                minimum: 1,
            });
        };
        let to_f64 = |v: &[T]| v.iter().map(|x| x.value_as_f64()).collect::<Array1<_>>();
        let output = self.fit(
            to_f64(&t).view(),
            to_f64(&values[0]).view(),
            to_f64(&values[1]).view(),
            period,
        )?;
        let phases = self.n_harmonics..2 * self.n_harmonics - 1;
        Ok(output
            .into_iter()
            .enumerate()
            .map(|(i, x)| {
                let x = T::approx_from_f64(x);
                if phases.contains(&i) { wrap_phase(x) } else { x }
            })
            .collect())
    }

    fn feature_family(&self) -> &'static str {
        "Harmonics"
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Harmonics")]
struct HarmonicsParameters {
    n_harmonics: usize,
    error_floor: f64,
    fallback: PeriodExtractor,
}

impl From<Harmonics> for HarmonicsParameters {
    fn from(f: Harmonics) -> Self {
        Self {
            n_harmonics: f.n_harmonics,
            error_floor: f.error_floor,
            fallback: f.fallback,
        }
    }
}

impl From<HarmonicsParameters> for Harmonics {
    fn from(p: HarmonicsParameters) -> Self {
        Self::new(p.n_harmonics, p.error_floor, p.fallback)
    }
}

impl JsonSchema for Harmonics {
    json_schema!(HarmonicsParameters, false);
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
#[allow(clippy::excessive_precision)]
mod tests {
    use super::*;
    use crate::tests::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use log::Level;

    check_doc_static_method!(doc_static_method, Harmonics);
    check_names_descriptions!(names_descriptions, Harmonics::default());

    const PERIOD: f64 = 1.7;
    const PHASE_2: f64 = 0.4;

    /// Mean 15, amplitude 0.5 cosine and amplitude 0.3 second harmonic
    fn two_harmonics(t: f64, shift: f64) -> f64 {
        let x = 2.0 * PI * (t + shift) / PERIOD;
        15.0 + 0.5 * f64::cos(x) + 0.3 * f64::sin(2.0 * x + PHASE_2)
    }

    fn random_times(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t: Vec<f64> = (0..n).map(|_| 58000.0 + 100.0 * rng.random::<f64>()).collect();
        t.sort_by(|a, b| a.total_cmp(b));
        t
    }

    fn fit(t: &[f64], shift: f64) -> Vec<f64> {
        let m: Vec<_> = t.iter().map(|&t| two_harmonics(t, shift)).collect();
        let err = vec![0.02; t.len()];
        Harmonics::default()
            .fit(
                ArrayView1::from(t),
                ArrayView1::from(&m),
                ArrayView1::from(&err),
                PERIOD,
            )
            .unwrap()
    }

    #[test]
    fn names() {
        let harmonics = Harmonics::new(3, 0.01, PeriodExtractor::default());
        assert_eq!(
            harmonics.get_names(),
            [
                "Harmonics_mag_1",
                "Harmonics_mag_2",
                "Harmonics_mag_3",
                "Harmonics_phase_2",
                "Harmonics_phase_3",
                "Harmonics_mse"
            ]
        );
        assert_eq!(Harmonics::default().get_names().len(), 14);
        assert_eq!(
            harmonics.context_role(),
            ContextRole::consumer(ContextKey::Period)
        );
    }

    #[test]
    fn recovers_amplitudes_and_phase() {
        let t = random_times(100, 0);
        let features = fit(&t, 0.0);
        assert_eq!(features.len(), 14);
        assert_abs_diff_eq!(features[0], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(features[1], 0.3, epsilon = 1e-8);
        assert_abs_diff_eq!(&features[2..7], &[0.0; 5][..], epsilon = 1e-8);
        // 0.3 sin(2x + p) = 0.3 cos(2x - (pi/2 - p))
        assert_abs_diff_eq!(features[7], 0.5 * PI - PHASE_2, epsilon = 1e-6);
        assert_abs_diff_eq!(features[13], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn relative_phase_is_shift_invariant() {
        let t = random_times(60, 1);
        let original = fit(&t, 0.0);
        let shifted = fit(&t, 0.3 * PERIOD);
        assert_relative_eq!(&shifted[..2], &original[..2], max_relative = 1e-8);
        assert_abs_diff_eq!(shifted[7], original[7], epsilon = 1e-6);
    }

    #[test]
    fn phases_in_range_and_amplitudes_non_negative() {
        let mut rng = StdRng::seed_from_u64(2);
        let t = random_times(40, 3);
        let m: Vec<f64> = t.iter().map(|_| 15.0 + rng.random::<f64>()).collect();
        let err: Vec<f64> = t.iter().map(|_| 0.1 * rng.random::<f64>()).collect();
        let features = Harmonics::default()
            .fit(
                ArrayView1::from(&t),
                ArrayView1::from(&m),
                ArrayView1::from(&err),
                3.3,
            )
            .unwrap();
        assert!(features[..7].iter().all(|&a| a >= 0.0));
        assert!(
            features[7..13]
                .iter()
                .all(|&phase| (0.0..2.0 * PI).contains(&phase))
        );
        assert!(features[13].is_finite());
    }

    #[test]
    fn wrap_phase_never_gives_two_pi() {
        assert_eq!(wrap_phase(-1e-17), 0.0);
        assert_eq!(wrap_phase(2.0 * PI), 0.0);
        assert_abs_diff_eq!(wrap_phase(-0.5), 2.0 * PI - 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(wrap_phase(7.0), 7.0 - 2.0 * PI, epsilon = 1e-15);
        // Rounds to the single precision 2 pi
        let phase = f32::approx_from_f64(2.0 * PI - 1e-10);
        assert_eq!(wrap_phase(phase), 0.0);
    }

    #[test]
    fn zero_relative_phase_is_in_range() {
        let harmonics = Harmonics::new(2, 0.01, PeriodExtractor::default());
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            let t: Vec<f64> = (0..30).map(|_| 10.0 * rng.random::<f64>()).collect();
            let m: Vec<f64> = t
                .iter()
                .map(|&t| 15.0 + f64::cos(2.0 * PI * t) + 0.5 * f64::cos(4.0 * PI * t))
                .collect();
            let err = vec![0.01; t.len()];
            let features = harmonics
                .fit(
                    ArrayView1::from(&t),
                    ArrayView1::from(&m),
                    ArrayView1::from(&err),
                    1.0,
                )
                .unwrap();
            let phase = features[2];
            assert!((0.0..2.0 * PI).contains(&phase), "seed {seed}: {phase}");
            assert!(f64::min(phase, 2.0 * PI - phase) < 1e-6, "seed {seed}: {phase}");
        }
    }

    #[test]
    fn single_precision_phases_are_in_range() {
        let t = random_times(50, 7);
        let m: Vec<f32> = t
            .iter()
            .map(|&t| (15.0 + f64::cos(2.0 * PI * t) + 0.5 * f64::cos(4.0 * PI * t)) as f32)
            .collect();
        let t: Vec<f32> = t.iter().map(|&t| t as f32).collect();
        let err = vec![0.01_f32; t.len()];
        let table = LightCurveTable::from_columns(
            vec!["ZTF1"; t.len()],
            t,
            vec![Band(1); m.len()],
            [(Column::MagpsfMl, m), (Column::SigmapsfMl, err)],
        )
        .unwrap();
        let ctx = SharedContext::new().with_table(
            ContextKey::Period,
            FeatureTable::from_rows(
                vec![MULTIBAND_PERIOD_FIELD.to_owned()],
                [("ZTF1".to_owned(), vec![1.0_f32])],
            ),
        );
        let harmonics = Harmonics::new(3, 0.01, PeriodExtractor::default());
        let values = harmonics
            .compute_for_band("ZTF1", table.get("ZTF1").unwrap(), Band(1), &ctx)
            .into_values(6);
        assert!(values.iter().all(|x| x.is_finite()), "{values:?}");
        assert!(
            values[3..5]
                .iter()
                .all(|&phase| (0.0..2.0 * std::f32::consts::PI).contains(&phase))
        );
    }

    #[test]
    fn different_array_lengths() {
        let t = [1.0, 2.0, 3.0];
        let result = Harmonics::default().fit(
            ArrayView1::from(&t),
            ArrayView1::from(&t[..2]),
            ArrayView1::from(&t),
            1.0,
        );
        assert_eq!(
            result,
            Err(EvaluatorError::ArrayLengthMismatch {
                t: 3,
                values: 2,
                errors: 3
            })
        );
    }

    #[test]
    fn fewer_observations_than_coefficients() {
        let t = random_times(5, 4);
        let features = fit(&t, 0.0);
        assert!(features.iter().all(|x| x.is_finite()), "{features:?}");
        // Minimum-norm solution interpolates the data
        assert_abs_diff_eq!(features[13], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_period() {
        let t = [1.0, 2.0, 3.0];
        let harmonics = Harmonics::default();
        for period in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = harmonics.fit(
                ArrayView1::from(&t),
                ArrayView1::from(&t),
                ArrayView1::from(&t),
                period,
            );
            assert!(matches!(result, Err(EvaluatorError::NonFinitePeriod(_))));
        }
    }

    #[test]
    fn period_from_context() {
        let t = random_times(50, 5);
        let m: Vec<_> = t.iter().map(|&t| two_harmonics(t, 0.0)).collect();
        let err = vec![0.02; t.len()];
        let table = table_from_band_arrays(
            "ZTF1",
            Band(1),
            &t,
            [(Column::MagpsfMl, &m[..]), (Column::SigmapsfMl, &err[..])],
        );
        let ctx = period_context(&[("ZTF1", PERIOD)]);
        let harmonics = Harmonics::default();
        let lc = table.get("ZTF1").unwrap();

        let row = harmonics.compute_for_band("ZTF1", lc, Band(1), &ctx);
        let values = row.into_values(14);
        assert_abs_diff_eq!(values[0], 0.5, epsilon = 1e-6);

        let row = harmonics.compute_for_band("ZTF1", lc, Band(2), &ctx);
        assert_eq!(row, FeatureRow::Missing(MissingReason::NoDetectionsInBand));
    }

    #[test]
    fn period_of_other_object() {
        let t = random_times(20, 6);
        let m = vec![15.0; t.len()];
        let table = table_from_band_arrays(
            "ZTF1",
            Band(1),
            &t,
            [(Column::MagpsfMl, &m[..]), (Column::SigmapsfMl, &m[..])],
        );
        let ctx = period_context(&[("ZTF2", PERIOD)]);
        let row = Harmonics::default().compute_for_band(
            "ZTF1",
            table.get("ZTF1").unwrap(),
            Band(1),
            &ctx,
        );
        assert!(matches!(
            row,
            FeatureRow::Missing(MissingReason::Failed(EvaluatorError::PeriodUnavailable(_)))
        ));
    }

    #[test]
    fn fallback_period() {
        init_logger();
        let table = periodic_table(&[("ZTF1", 2.7, 0)]);
        let ctx = SharedContext::new();
        let harmonics = Harmonics::default();
        let prepared = BandFeatureEvaluator::<f64>::prepare_context(&harmonics, &table, &ctx);
        assert!(matches!(prepared, Cow::Owned(_)));
        let period = prepared
            .lookup(ContextKey::Period, "ZTF1", MULTIBAND_PERIOD_FIELD)
            .unwrap();
        assert_relative_eq!(period, 2.7, max_relative = 0.01);
        assert!(logged(
            Level::Info,
            &["not provided with period data", "computing periodogram"]
        ));

        let provided = period_context(&[("ZTF1", 2.7)]);
        let prepared = BandFeatureEvaluator::<f64>::prepare_context(&harmonics, &table, &provided);
        assert!(matches!(prepared, Cow::Borrowed(_)));
    }

    #[test]
    fn serialization() {
        let harmonics = Harmonics::new(4, 0.1, PeriodExtractor::default());
        let json = serde_json::to_string(&harmonics).unwrap();
        let deserialized: Harmonics = serde_json::from_str(&json).unwrap();
        assert_eq!(harmonics, deserialized);
        assert_eq!(deserialized.get_names().len(), 8);
    }
}
