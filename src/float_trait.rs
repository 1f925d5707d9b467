use ndarray::NdFloat;
use num_traits::FloatConst;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::iter::Sum;

/// Floating number trait to be used for time series, feature values and feature parameters
///
/// It is implemented for [f32] and [f64]. Non-linear and linear fits are always performed with
/// [f64] precision, [Float::value_as_f64] and [Float::approx_from_f64] convert the values.
pub trait Float:
    NdFloat + FloatConst + Sum + Debug + Serialize + DeserializeOwned + JsonSchema
{
    fn half() -> Self;
    fn two() -> Self;

    fn value_as_f64(self) -> f64;
    fn approx_from_f64(x: f64) -> Self;

    fn approx_from_usize(x: usize) -> Self {
        Self::approx_from_f64(x as f64)
    }
}

macro_rules! float_trait_impl {
    ($float: ty) => {
        impl Float for $float {
            #[inline]
            fn half() -> Self {
                0.5
            }

            #[inline]
            fn two() -> Self {
                2.0
            }

            #[inline]
            fn value_as_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn approx_from_f64(x: f64) -> Self {
                x as Self
            }
        }
    };
}

float_trait_impl!(f32);
float_trait_impl!(f64);
