use crate::float_trait::Float;
use crate::periodogram::recurrent_sin_cos::RecurrentSinCos;

use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use macro_const::macro_const;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

macro_const! {
    const NYQUIST_FREQ_DOC: &'static str = r"Strategy to choose the highest frequency of the periodogram grid

Irregular sampling has no strict Nyquist limit, so the limit is taken as $\pi / \delta t$ with
$\delta t$ being a representative interval between observations.
";
}

#[doc = NYQUIST_FREQ_DOC!()]
#[enum_dispatch]
trait NyquistFreqTrait: Send + Sync + Clone + Debug {
    fn nyquist_freq<T: Float>(&self, t: &[T]) -> T;
}

#[doc = NYQUIST_FREQ_DOC!()]
#[enum_dispatch(NyquistFreqTrait)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum NyquistFreq {
    Average(AverageNyquistFreq),
    Median(MedianNyquistFreq),
    Fixed(FixedNyquistFreq),
}

impl NyquistFreq {
    pub fn average() -> Self {
        Self::Average(AverageNyquistFreq)
    }

    pub fn median() -> Self {
        Self::Median(MedianNyquistFreq)
    }

    pub fn fixed(freq: f32) -> Self {
        Self::Fixed(FixedNyquistFreq(freq))
    }
}

impl Default for NyquistFreq {
    fn default() -> Self {
        Self::average()
    }
}

/// $\delta t = \mathrm{duration} / (N - 1)$, so a regular grid gets its exact Nyquist frequency
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Average")]
pub struct AverageNyquistFreq;

impl NyquistFreqTrait for AverageNyquistFreq {
    fn nyquist_freq<T: Float>(&self, t: &[T]) -> T {
        let n = t.len();
        T::PI() * T::approx_from_usize(n - 1) / (t[n - 1] - t[0])
    }
}

/// $\delta t$ is the median of consecutive time differences
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Median")]
pub struct MedianNyquistFreq;

impl NyquistFreqTrait for MedianNyquistFreq {
    fn nyquist_freq<T: Float>(&self, t: &[T]) -> T {
        let dt = t
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| b - a)
            .sorted_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .collect_vec();
        let n = dt.len();
        let median = if n % 2 == 0 {
            T::half() * (dt[n / 2 - 1] + dt[n / 2])
        } else {
            dt[n / 2]
        };
        T::PI() / median
    }
}

/// Constant angular frequency, scaled by `max_freq_factor` as the other strategies
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Fixed")]
pub struct FixedNyquistFreq(pub f32);

impl NyquistFreqTrait for FixedNyquistFreq {
    fn nyquist_freq<T: Float>(&self, _t: &[T]) -> T {
        T::approx_from_f64(self.0 as f64)
    }
}

/// Parameters of a frequency grid derived from observation times
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DynamicFreqGridParams {
    pub resolution: f32,
    pub max_freq_factor: f32,
    pub nyquist: NyquistFreq,
    /// Upper limit of the grid size
    pub max_size: usize,
}

impl DynamicFreqGridParams {
    pub fn new(
        resolution: f32,
        max_freq_factor: f32,
        nyquist: impl Into<NyquistFreq>,
        max_size: usize,
    ) -> Self {
        assert!(resolution > 0.0, "Resolution must be positive");
        assert!(max_freq_factor > 0.0, "Max frequency must be positive");
        assert!(max_size > 0, "Maximum grid size must be positive");
        Self {
            resolution,
            max_freq_factor,
            nyquist: nyquist.into(),
            max_size,
        }
    }

    #[inline]
    fn duration_step_max_freq<T: Float>(&self, t: &[T]) -> (T, T, T) {
        let sizef = T::approx_from_usize(t.len());
        let duration = t[t.len() - 1] - t[0];
        let step = T::two() * T::PI() * (sizef - T::one())
            / (sizef * T::approx_from_f64(self.resolution as f64) * duration);
        let max_freq =
            self.nyquist.nyquist_freq(t) * T::approx_from_f64(self.max_freq_factor as f64);
        (duration, step, max_freq)
    }
}

/// Uniform angular frequency grid
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(bound = "T: Float")]
pub struct LinearFreqGrid<T: Float> {
    /// Grid start point
    start: T,
    /// Distance between points
    step: T,
    /// Number of points
    size: usize,
}

impl<T: Float> LinearFreqGrid<T> {
    pub fn new(start: T, step: T, size: usize) -> Self {
        assert!(start >= T::zero(), "start must not be negative");
        assert!(
            step.is_finite() && step.is_sign_positive(),
            "frequency step must be finite and positive"
        );
        assert!(size > 0, "Size must not be zero");
        Self { start, step, size }
    }

    /// Grid for sorted time array of at least two distinct values
    ///
    /// Returns [None] if the time array gives a degenerate grid
    pub fn from_t(t: &[T], params: &DynamicFreqGridParams) -> Option<Self> {
        if t.len() < 2 {
            return None;
        }
        let (duration, step, max_freq) = params.duration_step_max_freq(t);
        if !(duration.is_finite() && duration > T::zero() && step.is_finite() && step > T::zero())
        {
            return None;
        }
        // Corresponds to the half-duration
        let min_freq = T::two() * T::two() * T::PI() / duration;
        let size = {
            let sizef = ((max_freq - min_freq) / step).round();
            if sizef >= T::one() {
                (sizef.value_as_f64() as usize).min(params.max_size)
            } else {
                1
            }
        };
        Some(Self {
            start: min_freq,
            step,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn step(&self) -> T {
        self.step
    }

    pub fn get(&self, i: usize) -> T {
        self.start + self.step * T::approx_from_usize(i)
    }

    pub fn minimum(&self) -> T {
        self.start
    }

    pub fn maximum(&self) -> T {
        self.get(self.size - 1)
    }

    /// Iterator of (sin(freq * time), cos(freq * time)) over the freq values
    pub fn iter_sin_cos_mul(&self, time: T) -> RecurrentSinCos<T> {
        RecurrentSinCos::new(self.start * time, self.step * time)
    }
}
