use crate::error::CurveFitError;
use crate::nl_fit::cobyla::CobylaCurveFit;
use crate::nl_fit::data::Data;
use crate::nl_fit::lm::LmCurveFit;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Converged solution
#[derive(Clone, Debug, PartialEq)]
pub struct CurveFitResult<const NPARAMS: usize> {
    pub x: [f64; NPARAMS],
    /// Sum of squared weighted residuals at `x`
    pub sum_squares: f64,
    /// Number of optimizer iterations, algorithms not reporting it give their iteration limit
    pub niterations: usize,
}

#[enum_dispatch]
pub trait CurveFitTrait: Clone + Debug + Serialize + DeserializeOwned {
    /// Minimise sum of squared weighted residuals within the bounds
    ///
    /// `ftol` is the relative tolerance of the objective: the algorithm converges when a step
    /// reduces the objective by less than `ftol` times its value.
    fn curve_fit<F, const NPARAMS: usize>(
        &self,
        data: &Data<f64>,
        x0: &[f64; NPARAMS],
        bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        ftol: f64,
        model: F,
    ) -> Result<CurveFitResult<NPARAMS>, CurveFitError>
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64;
}

/// Optimization algorithm for non-linear least-squares fitting
#[enum_dispatch(CurveFitTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CurveFitAlgorithm {
    Lm(LmCurveFit),
    Cobyla(CobylaCurveFit),
}

impl Default for CurveFitAlgorithm {
    fn default() -> Self {
        LmCurveFit::default().into()
    }
}

/// Sum of squared weighted residuals
pub(super) fn sum_squares<F, const NPARAMS: usize>(
    data: &Data<f64>,
    x: &[f64; NPARAMS],
    model: &F,
) -> f64
where
    F: Fn(f64, &[f64; NPARAMS]) -> f64,
{
    ndarray::Zip::from(&data.t)
        .and(&data.m)
        .and(&data.inv_err)
        .fold(0.0, |acc, &t, &m, &inv_err| {
            acc + ((model(t, x) - m) * inv_err).powi(2)
        })
}
