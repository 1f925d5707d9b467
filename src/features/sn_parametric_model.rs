use crate::data::BandSelection;
use crate::error::CurveFitError;
use crate::evaluator::*;
use crate::nl_fit::{CurveFitAlgorithm, CurveFitTrait, Data, clip};

use log::debug;
use macro_const::macro_const;
use ndarray::{Array1, ArrayView1, Zip};

const NPARAMS: usize = 6;

/// Fixed slope of the logistic switch between the rise and the fall, its inverse
const SIGMOID_SCALE: f64 = 3.0;

macro_const! {
    const DOC: &str = r#"
Supernova parametric model (SPM) fit

Six fit parameters and goodness of fit (reduced $\chi^2$) of the parametric model developed for
supernova light curves:

$$
f(t) = \frac{A \left(1 - \beta \frac{t - t_0}{\gamma}\right) \left(1 - \sigma(t)\right)
       + A (1 - \beta)\, \mathrm{e}^{-(t - t_1)/\tau_\mathrm{fall}}\, \sigma(t)}
       {1 + \mathrm{e}^{-(t - t_0)/\tau_\mathrm{rise}}},
$$

where $t_1 = t_0 + \gamma$ and $\sigma(t) = 1 / \left(1 + \mathrm{e}^{-(t - t_1)/3}\right)$ is a
smooth switch from the linear decline to the exponential decay.

The fit is unweighted bounded non-linear least squares in flux space, the time is shifted to start
at zero. Magnitudes are converted to fluxes as $10^{-(m + 48.6)/2.5 + 26}$. If the fit with the
relative tolerance $A_\mathrm{guess} / 20$ fails, it is repeated with $A_\mathrm{guess} / 3$, and
if it fails again all the features are missing. The bounded fit runs for any non-empty light
curve. The reduced $\chi^2$ uses flux errors increased by $0.01$ and it is missing for less than
seven observations.

- Depends on: **time**, **magnitude** and **magnitude error**, or **difference flux** and its
  **error**
- Minimum number of observations: **1**
- Number of features: **7**
"#;
}

/// Detection columns the model is fitted to
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpmInput {
    /// PSF magnitudes converted to fluxes
    #[default]
    Magnitude,
    /// Difference-image fluxes used as is
    DifferenceFlux,
}

impl SpmInput {
    /// Value and error columns
    pub fn columns(&self) -> [Column; 2] {
        match self {
            SpmInput::Magnitude => [Column::Magpsf, Column::Sigmapsf],
            SpmInput::DifferenceFlux => [Column::DiffFlux, Column::DiffErr],
        }
    }

    fn flux_and_error(
        &self,
        values: ArrayView1<f64>,
        errors: ArrayView1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        match self {
            SpmInput::Magnitude => {
                let flux = values.mapv(mag_to_flux);
                // Lower magnitude is higher flux
                let flux_err = Zip::from(&values)
                    .and(&errors)
                    .and(&flux)
                    .map_collect(|&mag, &err, &flux| mag_to_flux(mag - err) - flux);
                (flux, flux_err)
            }
            SpmInput::DifferenceFlux => (values.to_owned(), errors.to_owned()),
        }
    }
}

/// AB magnitude to flux in units of $10^{26}$ erg/s/cm²/Hz
pub fn mag_to_flux(mag: f64) -> f64 {
    10.0_f64.powf(-(mag + 48.6) / 2.5 + 26.0)
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(
    from = "SnParametricModelParameters",
    into = "SnParametricModelParameters"
)]
pub struct SnParametricModel {
    input: SpmInput,
    algorithm: CurveFitAlgorithm,
    tight_ftol_divisor: f64,
    loose_ftol_divisor: f64,
    error_floor: f64,
    properties: Box<EvaluatorProperties>,
}

impl SnParametricModel {
    /// New [SnParametricModel] instance
    ///
    /// `input` selects the columns to fit, `algorithm` is the [CurveFitAlgorithm] to use. The
    /// relative tolerance of the first fit is $A_\mathrm{guess}$ divided by
    /// `tight_ftol_divisor`, of the retry by `loose_ftol_divisor`. `error_floor` is added to flux
    /// errors for the reduced $\chi^2$.
    pub fn new(
        input: SpmInput,
        algorithm: CurveFitAlgorithm,
        tight_ftol_divisor: f64,
        loose_ftol_divisor: f64,
        error_floor: f64,
    ) -> Self {
        assert!(
            tight_ftol_divisor.is_finite() && tight_ftol_divisor > 0.0,
            "tight_ftol_divisor must be positive"
        );
        assert!(
            loose_ftol_divisor.is_finite() && loose_ftol_divisor > 0.0,
            "loose_ftol_divisor must be positive"
        );
        assert!(
            error_floor.is_finite() && error_floor >= 0.0,
            "error_floor must be non-negative"
        );
        let [value_column, error_column] = input.columns();
        Self {
            input,
            algorithm,
            tight_ftol_divisor,
            loose_ftol_divisor,
            error_floor,
            properties: EvaluatorProperties {
                names: [
                    "SPM_A",
                    "SPM_t0",
                    "SPM_gamma",
                    "SPM_beta",
                    "SPM_tau_rise",
                    "SPM_tau_fall",
                    "SPM_chi",
                ]
                .map(String::from)
                .into(),
                descriptions: [
                    "SPM amplitude (A)",
                    "SPM reference time relative to the first observation (t0)",
                    "SPM plateau duration (gamma)",
                    "SPM plateau decline (beta)",
                    "SPM rise time scale (tau_rise)",
                    "SPM fall time scale (tau_fall)",
                    "SPM fit quality (reduced chi2)",
                ]
                .map(String::from)
                .into(),
                required_columns: [Column::Mjd, Column::Fid, value_column, error_column].into(),
            }
            .into(),
        }
    }

    /// Fit of magnitudes, see [SpmInput::Magnitude]
    pub fn magnitude() -> Self {
        Self::with_input(SpmInput::Magnitude)
    }

    /// Fit of difference fluxes, see [SpmInput::DifferenceFlux]
    pub fn difference_flux() -> Self {
        Self::with_input(SpmInput::DifferenceFlux)
    }

    pub fn with_input(input: SpmInput) -> Self {
        Self::new(
            input,
            Self::default_algorithm(),
            Self::default_tight_ftol_divisor(),
            Self::default_loose_ftol_divisor(),
            Self::default_error_floor(),
        )
    }

    #[inline]
    pub fn default_algorithm() -> CurveFitAlgorithm {
        CurveFitAlgorithm::default()
    }

    #[inline]
    pub fn default_tight_ftol_divisor() -> f64 {
        20.0
    }

    #[inline]
    pub fn default_loose_ftol_divisor() -> f64 {
        3.0
    }

    #[inline]
    pub fn default_error_floor() -> f64 {
        0.01
    }

    pub fn input(&self) -> SpmInput {
        self.input
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    /// Model flux, `param` is `[A, t0, gamma, beta, tau_rise, tau_fall]`
    pub fn model(t: f64, param: &[f64; NPARAMS]) -> f64 {
        let [a, t0, gamma, beta, tau_rise, tau_fall] = *param;
        let t1 = t0 + gamma;
        let sigmoid = (1.0 + f64::exp(-(t - t1) / SIGMOID_SCALE)).recip();
        let den = 1.0 + f64::exp(-(t - t0) / tau_rise);
        a * (1.0 - beta) * f64::exp(-(t - t1) / tau_fall) / den * sigmoid
            + a * (1.0 - beta * (t - t0) / gamma) / den * (1.0 - sigmoid)
    }

    /// Initial guess, lower and upper bounds from the data, `t` must start at zero
    pub fn init_and_bounds(
        t: ArrayView1<f64>,
        flux: ArrayView1<f64>,
    ) -> ([f64; NPARAMS], [f64; NPARAMS], [f64; NPARAMS]) {
        let i_peak = crate::array_stats::argmax(flux).unwrap_or(0);
        let peak = flux[i_peak];
        let t_peak = t[i_peak];
        let t_max = t.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));

        let lower = [peak / 3.0, -50.0, 1.0, 0.0, 1.0, 1.0];
        let upper = [3.0 * peak, 50.0, 100.0, 1.0, 100.0, 100.0];
        let init = [
            clip(1.2 * peak, lower[0], upper[0]),
            -5.0,
            clip(t_max, lower[2], upper[2]),
            0.5,
            clip(0.5 * t_peak, lower[4], upper[4]),
            40.0,
        ];
        (init, lower, upper)
    }

    fn fit(&self, data: &Data<f64>) -> Result<[f64; NPARAMS], CurveFitError> {
        let (init, lower, upper) = Self::init_and_bounds(data.t.view(), data.m.view());
        let a_guess = init[0];
        let bounds = (&lower, &upper);
        self.algorithm
            .curve_fit(
                data,
                &init,
                bounds,
                a_guess / self.tight_ftol_divisor,
                Self::model,
            )
            .or_else(|err| {
                debug!("SPM fit failed with tight tolerance, retrying: {err}");
                self.algorithm.curve_fit(
                    data,
                    &init,
                    bounds,
                    a_guess / self.loose_ftol_divisor,
                    Self::model,
                )
            })
            .map(|result| result.x)
    }

    /// Reduced $\chi^2$, NaN if there are no more observations than parameters
    fn reduced_chi2(
        &self,
        t: &Array1<f64>,
        flux: &Array1<f64>,
        flux_err: &Array1<f64>,
        param: &[f64; NPARAMS],
    ) -> f64 {
        if t.len() <= NPARAMS {
            return f64::NAN;
        }
        let chi2 = Zip::from(t)
            .and(flux)
            .and(flux_err)
            .fold(0.0, |acc, &t, &flux, &err| {
                acc + ((Self::model(t, param) - flux) / (err + self.error_floor)).powi(2)
            });
        chi2 / (t.len() - NPARAMS) as f64
    }

    /// Fit parameters and reduced $\chi^2$ for time, value and error arrays of a single band
    ///
    /// Values and errors are magnitudes or fluxes depending on [SpmInput]. Time is shifted to
    /// start at zero.
    pub fn eval_arrays(
        &self,
        t: ArrayView1<f64>,
        values: ArrayView1<f64>,
        errors: ArrayView1<f64>,
    ) -> Result<[f64; NPARAMS + 1], EvaluatorError> {
        check_lengths(t.len(), values.len(), errors.len())?;
        if t.is_empty() {
            return Err(EvaluatorError::ShortTimeSeries {
                actual: 0,
                minimum: 1,
            });
        }
        let t0 = t.fold(f64::INFINITY, |acc, &x| acc.min(x));
        let t = t.mapv(|x| x - t0);
        let (flux, flux_err) = self.input.flux_and_error(values, errors);

        let data = Data::unweighted(t, flux);
        let param = self.fit(&data)?;
        let chi2 = self.reduced_chi2(&data.t, &data.m, &flux_err, &param);

        let mut output = [0.0; NPARAMS + 1];
        output[..NPARAMS].copy_from_slice(&param);
        output[NPARAMS] = chi2;
        Ok(output)
    }
}

impl Default for SnParametricModel {
    fn default() -> Self {
        Self::magnitude()
    }
}

impl FeatureNamesDescriptionsTrait for SnParametricModel {
    properties_names_descriptions!();
}

impl RequiredColumnsTrait for SnParametricModel {
    fn required_columns(&self) -> &ColumnSet {
        &self.properties.required_columns
    }
}

impl ContextRoleTrait for SnParametricModel {
    fn context_role(&self) -> ContextRole {
        ContextRole::none()
    }
}

impl<T> BandFeatureEvaluator<T> for SnParametricModel
where
    T: Float,
{
    fn eval_band(
        &self,
        _oid: &str,
        lc: &ObjectLightCurve<T>,
        band: Band,
        _ctx: &SharedContext<T>,
    ) -> Result<Vec<T>, EvaluatorError> {
        let Some(BandSelection { t, values }) = lc.select(band, &self.input.columns()) else {
            return Err(EvaluatorError::ShortTimeSeries {
                actual: 0,
                minimum: 1,
            });
        };
        let to_f64 = |v: &[T]| v.iter().map(|x| x.value_as_f64()).collect::<Array1<_>>();
        let output = self.eval_arrays(
            to_f64(&t).view(),
            to_f64(&values[0]).view(),
            to_f64(&values[1]).view(),
        )?;
        Ok(output.iter().map(|&x| T::approx_from_f64(x)).collect())
    }

    fn feature_family(&self) -> &'static str {
        "SPM"
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "SnParametricModel")]
struct SnParametricModelParameters {
    input: SpmInput,
    algorithm: CurveFitAlgorithm,
    tight_ftol_divisor: f64,
    loose_ftol_divisor: f64,
    error_floor: f64,
}

impl From<SnParametricModel> for SnParametricModelParameters {
    fn from(f: SnParametricModel) -> Self {
        Self {
            input: f.input,
            algorithm: f.algorithm,
            tight_ftol_divisor: f.tight_ftol_divisor,
            loose_ftol_divisor: f.loose_ftol_divisor,
            error_floor: f.error_floor,
        }
    }
}

impl From<SnParametricModelParameters> for SnParametricModel {
    fn from(p: SnParametricModelParameters) -> Self {
        Self::new(
            p.input,
            p.algorithm,
            p.tight_ftol_divisor,
            p.loose_ftol_divisor,
            p.error_floor,
        )
    }
}

impl JsonSchema for SnParametricModel {
    json_schema!(SnParametricModelParameters, false);
}
