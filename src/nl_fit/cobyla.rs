use crate::error::CurveFitError;
use crate::nl_fit::bounds::check_bounds;
use crate::nl_fit::curve_fit::{CurveFitResult, CurveFitTrait, sum_squares};
use crate::nl_fit::data::Data;

use cobyla::{Func, RhoBeg, StopTols, SuccessStatus, minimize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// COBYLA (Constrained Optimization BY Linear Approximations) non-linear least-squares wrapper
///
/// COBYLA is a derivative-free optimization algorithm, bounds are passed to it as constraints.
/// It is described in M.J.D. Powell's 1994 paper "A direct search optimization method that models
/// the objective and constraint functions by linear interpolation".
///
/// The `ftol` argument of [CurveFitTrait::curve_fit] is used as COBYLA's relative function value
/// tolerance. Exhausting `niterations` objective evaluations is an error.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Cobyla")]
pub struct CobylaCurveFit {
    pub niterations: usize,
    pub rhobeg: f64,
}

impl CobylaCurveFit {
    /// Create a new [CobylaCurveFit].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of function evaluations
    /// - `rhobeg`: initial change to parameters (controls initial simplex size)
    pub fn new(niterations: usize, rhobeg: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            rhobeg.is_finite() && rhobeg > 0.0,
            "rhobeg must be finite and positive"
        );
        Self {
            niterations,
            rhobeg,
        }
    }

    #[inline]
    pub fn default_niterations() -> usize {
        2000
    }

    #[inline]
    pub fn default_rhobeg() -> f64 {
        0.5
    }
}

impl Default for CobylaCurveFit {
    fn default() -> Self {
        Self::new(Self::default_niterations(), Self::default_rhobeg())
    }
}

impl CurveFitTrait for CobylaCurveFit {
    fn curve_fit<F, const NPARAMS: usize>(
        &self,
        data: &Data<f64>,
        x0: &[f64; NPARAMS],
        bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        ftol: f64,
        model: F,
    ) -> Result<CurveFitResult<NPARAMS>, CurveFitError>
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        let (lower, upper) = bounds;
        check_bounds(x0, lower, upper)?;
        if !sum_squares(data, x0, &model).is_finite() {
            return Err(CurveFitError::NonFiniteResidual);
        }

        let objective = |x: &[f64], _user_data: &mut ()| -> f64 {
            let mut params = [0.0; NPARAMS];
            params.copy_from_slice(x);
            let value = sum_squares(data, &params, &model);
            // COBYLA cannot recover from NaN
            if value.is_finite() { value } else { f64::MAX }
        };

        let cobyla_bounds: Vec<(f64, f64)> = lower
            .iter()
            .zip(upper.iter())
            .map(|(&lower, &upper)| (lower, upper))
            .collect();

        // No additional constraints beyond bounds
        let constraints: Vec<&dyn Func<()>> = vec![];

        let stop_tol = StopTols {
            ftol_rel: ftol,
            ..StopTols::default()
        };

        let (status, x_vec, value) = minimize(
            objective,
            x0,
            &cobyla_bounds,
            &constraints,
            (),
            self.niterations,
            RhoBeg::All(self.rhobeg),
            Some(stop_tol),
        )
        .map_err(|_| CurveFitError::RoundoffLimited)?;

        match status {
            SuccessStatus::Success | SuccessStatus::FtolReached | SuccessStatus::XtolReached => {
                let mut x = [0.0; NPARAMS];
                x.copy_from_slice(&x_vec);
                if value.is_finite() && value < f64::MAX {
                    Ok(CurveFitResult {
                        x,
                        sum_squares: value,
                        niterations: self.niterations,
                    })
                } else {
                    Err(CurveFitError::NonFiniteResidual)
                }
            }
            _ => Err(CurveFitError::IterationLimit(self.niterations)),
        }
    }
}
