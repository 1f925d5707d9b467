//! Feature extractors

mod harmonics;
pub use harmonics::Harmonics;

mod period;
pub use period::PeriodExtractor;

mod sn_parametric_model;
pub use sn_parametric_model::{SnParametricModel, SpmInput, mag_to_flux};
