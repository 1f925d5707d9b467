use crate::error::CurveFitError;

pub(super) fn within_bounds<T, const NPARAMS: usize>(
    x: &[T; NPARAMS],
    lower: &[T; NPARAMS],
    upper: &[T; NPARAMS],
) -> bool
where
    T: PartialOrd,
{
    for i in 0..NPARAMS {
        if !(x[i] >= lower[i] && x[i] <= upper[i]) {
            return false;
        }
    }
    true
}

/// Box must be non-empty in every dimension and contain the initial guess
pub(crate) fn check_bounds<const NPARAMS: usize>(
    x0: &[f64; NPARAMS],
    lower: &[f64; NPARAMS],
    upper: &[f64; NPARAMS],
) -> Result<(), CurveFitError> {
    let non_empty = lower.iter().zip(upper.iter()).all(|(l, u)| l < u);
    if non_empty && within_bounds(x0, lower, upper) {
        Ok(())
    } else {
        Err(CurveFitError::InfeasibleBounds)
    }
}

/// Never panics, for `lower > upper` gives `upper`
#[inline]
pub(crate) fn clip(x: f64, lower: f64, upper: f64) -> f64 {
    x.max(lower).min(upper)
}
