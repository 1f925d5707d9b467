use crate::error::CurveFitError;
use crate::nl_fit::bounds::{check_bounds, clip};
use crate::nl_fit::curve_fit::{CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;

use nalgebra::{DMatrix, DVector};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
/// Damping factor multipliers after a rejected and an accepted step
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 0.1;
const MIN_DIAG: f64 = 1e-12;

/// Levenberg-Marquardt non-linear least-squares with box constraints
///
/// Jacobian is estimated with forward differences, the damped normal equations
/// $(J^T J + \lambda\,\mathrm{diag}\,J^T J) \delta = -J^T r$ are solved with Cholesky
/// decomposition, and every trial point is projected onto the bounds. A trial step is accepted
/// only if it decreases the objective, otherwise the damping factor grows. The fit converges when
/// an accepted step reduces the objective by less than `ftol` times its value, when the step is
/// smaller than `xtol` relative to the parameters, or when no step can decrease the objective.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Lm")]
pub struct LmCurveFit {
    pub niterations: usize,
    pub xtol: f64,
    pub lambda0: f64,
}

impl LmCurveFit {
    /// Create a new [LmCurveFit].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of accepted steps
    /// - `xtol`: relative tolerance of the parameter step
    /// - `lambda0`: initial damping factor
    pub fn new(niterations: usize, xtol: f64, lambda0: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            xtol.is_finite() && xtol >= 0.0,
            "xtol must be finite and non-negative"
        );
        assert!(
            lambda0.is_finite() && lambda0 > 0.0,
            "lambda0 must be finite and positive"
        );
        Self {
            niterations,
            xtol,
            lambda0,
        }
    }

    #[inline]
    pub fn default_niterations() -> usize {
        200
    }

    #[inline]
    pub fn default_xtol() -> f64 {
        1e-8
    }

    #[inline]
    pub fn default_lambda0() -> f64 {
        1e-3
    }

    fn residuals<F, const NPARAMS: usize>(
        data: &Data<f64>,
        x: &[f64; NPARAMS],
        model: &F,
    ) -> DVector<f64>
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        DVector::from_iterator(
            data.len(),
            data.t
                .iter()
                .zip(data.m.iter())
                .zip(data.inv_err.iter())
                .map(|((&t, &m), &inv_err)| (model(t, x) - m) * inv_err),
        )
    }

    /// Forward-difference Jacobian, the step goes backward at the upper bound
    fn jacobian<F, const NPARAMS: usize>(
        data: &Data<f64>,
        x: &[f64; NPARAMS],
        r: &DVector<f64>,
        upper: &[f64; NPARAMS],
        model: &F,
    ) -> DMatrix<f64>
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        let mut jac = DMatrix::zeros(data.len(), NPARAMS);
        for j in 0..NPARAMS {
            let mut h = f64::EPSILON.sqrt() * f64::max(1.0, x[j].abs());
            if x[j] + h > upper[j] {
                h = -h;
            }
            let mut x_h = *x;
            x_h[j] += h;
            let r_h = Self::residuals(data, &x_h, model);
            jac.set_column(j, &((r_h - r) / h));
        }
        jac
    }

    fn step_is_small<const NPARAMS: usize>(&self, x: &[f64; NPARAMS], x_new: &[f64; NPARAMS]) -> bool {
        x.iter()
            .zip(x_new.iter())
            .all(|(&a, &b)| (b - a).abs() <= self.xtol * (self.xtol + a.abs()))
    }
}

impl Default for LmCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_xtol(),
            Self::default_lambda0(),
        )
    }
}

impl CurveFitTrait for LmCurveFit {
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

        let mut x = *x0;
        let mut r = Self::residuals(data, &x, &model);
        let mut cost = r.norm_squared();
        if !cost.is_finite() {
            return Err(CurveFitError::NonFiniteResidual);
        }
        let result = |x: [f64; NPARAMS], cost: f64, iteration: usize| CurveFitResult {
            x,
            sum_squares: cost,
            niterations: iteration,
        };

        let mut lambda = self.lambda0;
        for iteration in 0..self.niterations {
            if cost == 0.0 {
                return Ok(result(x, cost, iteration));
            }

            let jac = Self::jacobian(data, &x, &r, upper, &model);
            if jac.iter().any(|value| !value.is_finite()) {
                return Err(CurveFitError::NonFiniteResidual);
            }
            let jtj = jac.tr_mul(&jac);
            let gradient = jac.tr_mul(&r);

            loop {
                let mut a = jtj.clone();
                for i in 0..NPARAMS {
                    a[(i, i)] += lambda * f64::max(jtj[(i, i)], MIN_DIAG);
                }
                let step = match a.cholesky() {
                    Some(cholesky) => cholesky.solve(&(-&gradient)),
                    None => {
                        lambda *= LAMBDA_UP;
                        if lambda > LAMBDA_MAX {
                            return Ok(result(x, cost, iteration));
                        }
                        continue;
                    }
                };

                let mut x_new = x;
                for i in 0..NPARAMS {
                    x_new[i] = clip(x[i] + step[i], lower[i], upper[i]);
                }
                let r_new = Self::residuals(data, &x_new, &model);
                let cost_new = r_new.norm_squared();

                if cost_new.is_finite() && cost_new < cost {
                    let reduction = cost - cost_new;
                    let converged = reduction <= ftol * cost || self.step_is_small(&x, &x_new);
                    x = x_new;
                    r = r_new;
                    cost = cost_new;
                    lambda = f64::max(lambda * LAMBDA_DOWN, LAMBDA_MIN);
                    if converged {
                        return Ok(result(x, cost, iteration + 1));
                    }
                    break;
                }

                lambda *= LAMBDA_UP;
                if lambda > LAMBDA_MAX {
                    // No descent direction within the bounds, x is a local minimum
                    return Ok(result(x, cost, iteration));
                }
            }
        }
        Err(CurveFitError::IterationLimit(self.niterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use rand::prelude::*;
    use rand_distr::StandardNormal;

    fn nonlinear_func(t: f64, param: &[f64; 3]) -> f64 {
        param[1] * f64::exp(-param[0] * t) * t.powi(2) + param[2]
    }

    #[test]
    fn nonlinear() {
        const N: usize = 300;
        const NOISE: f64 = 0.5;

        let param_true = [0.75, 2.0, 0.5];
        let param_init = [1.0, 1.0, 1.0];

        let mut rng = StdRng::seed_from_u64(0);

        let t = Array1::linspace(0.0, 10.0, N);
        let y = t.mapv(|x| {
            let eps: f64 = rng.sample(StandardNormal);
            nonlinear_func(x, &param_true) + NOISE * eps
        });
        let data = Data::unweighted(t, y);

        let fitter = LmCurveFit::default();
        let result = fitter
            .curve_fit(
                &data,
                &param_init,
                (&[0.0, 0.0, -10.0], &[10.0, 10.0, 10.0]),
                1e-10,
                nonlinear_func,
            )
            .unwrap();

        assert_abs_diff_eq!(
            &result.x[..],
            &param_true[..],
            epsilon = NOISE * 3.0 / (N as f64).sqrt()
        );
    }

    #[test]
    fn active_bound() {
        let t = Array1::linspace(0.0, 1.0, 20);
        let y = t.mapv(|x| 3.0 * x);
        let data = Data::unweighted(t, y);
        let result = LmCurveFit::default()
            .curve_fit(&data, &[1.0], (&[0.0], &[2.0]), 1e-12, |t, p: &[f64; 1]| {
                p[0] * t
            })
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn exact_fit_stops() {
        let t = Array1::linspace(0.0, 1.0, 10);
        let y = t.mapv(|x| 2.0 * x + 1.0);
        let data = Data::unweighted(t, y);
        let result = LmCurveFit::default()
            .curve_fit(
                &data,
                &[2.0, 1.0],
                (&[-10.0, -10.0], &[10.0, 10.0]),
                1e-6,
                |t, p: &[f64; 2]| p[0] * t + p[1],
            )
            .unwrap();
        assert_eq!(result.x, [2.0, 1.0]);
        assert_eq!(result.niterations, 0);
    }

    #[test]
    fn infeasible_initial_guess() {
        let data = Data::unweighted(Array1::linspace(0.0, 1.0, 10), Array1::zeros(10));
        let result = LmCurveFit::default().curve_fit(
            &data,
            &[5.0],
            (&[0.0], &[1.0]),
            1e-6,
            |_t, p: &[f64; 1]| p[0],
        );
        assert_eq!(result, Err(CurveFitError::InfeasibleBounds));
    }

    #[test]
    fn non_finite_model() {
        let data = Data::unweighted(Array1::linspace(0.0, 1.0, 10), Array1::zeros(10));
        let result = LmCurveFit::default().curve_fit(
            &data,
            &[0.5],
            (&[0.0], &[1.0]),
            1e-6,
            |_t, _p: &[f64; 1]| f64::NAN,
        );
        assert_eq!(result, Err(CurveFitError::NonFiniteResidual));
    }

    #[test]
    fn iteration_limit() {
        let t = Array1::linspace(0.0, 10.0, 50);
        let y = t.mapv(|x| f64::exp(-0.3 * x));
        let data = Data::unweighted(t, y);
        let result = LmCurveFit::new(1, 0.0, 1e-3).curve_fit(
            &data,
            &[3.0],
            (&[0.0], &[10.0]),
            0.0,
            |t, p: &[f64; 1]| f64::exp(-p[0] * t),
        );
        assert_eq!(result, Err(CurveFitError::IterationLimit(1)));
    }
}
