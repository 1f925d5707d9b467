//! Bounded non-linear least squares
//!
//! Every algorithm minimises $\sum_i \left((\mathrm{model}(t_i) - m_i) / \delta_i\right)^2$ over a
//! box of parameter bounds. An initial guess outside of the box, or a box with a lower bound not
//! less than the corresponding upper bound, is a [CurveFitError::InfeasibleBounds] error. The
//! number of iterations is always bounded.
//!
//! [CurveFitError::InfeasibleBounds]: crate::error::CurveFitError::InfeasibleBounds

mod bounds;
pub(crate) use bounds::{check_bounds, clip};

pub mod cobyla;
pub use cobyla::CobylaCurveFit;

pub mod curve_fit;
pub use curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};

pub mod data;
pub use data::Data;

pub mod lm;
pub use lm::LmCurveFit;
