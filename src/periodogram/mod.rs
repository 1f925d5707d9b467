//! Lomb-Scargle periodogram on a uniform frequency grid

use crate::data::TimeSeries;
use crate::float_trait::Float;

mod freq;
pub use freq::{
    AverageNyquistFreq, DynamicFreqGridParams, FixedNyquistFreq, LinearFreqGrid,
    MedianNyquistFreq, NyquistFreq,
};

mod power_direct;
pub use power_direct::power_direct;

mod recurrent_sin_cos;
pub use recurrent_sin_cos::RecurrentSinCos;

/// Lomb-Scargle periodogram on a [LinearFreqGrid]
///
/// The grid spans angular frequencies from $4\pi / \mathrm{duration}$, i.e. a half of the time
/// span, up to `max_freq_factor` times the Nyquist frequency, with the step
/// $2\pi (N - 1) / (N \times \mathrm{resolution} \times \mathrm{duration})$, see
/// [DynamicFreqGridParams].
#[derive(Clone, Debug)]
pub struct Periodogram<T>
where
    T: Float,
{
    freq_grid: LinearFreqGrid<T>,
}

impl<T> Periodogram<T>
where
    T: Float,
{
    pub fn new(freq_grid: LinearFreqGrid<T>) -> Self {
        Self { freq_grid }
    }

    /// [None] for time arrays too short or too narrow to build a grid
    pub fn from_t(t: &[T], params: &DynamicFreqGridParams) -> Option<Self> {
        LinearFreqGrid::from_t(t, params).map(Self::new)
    }

    pub fn freq_grid(&self) -> &LinearFreqGrid<T> {
        &self.freq_grid
    }

    pub fn freq(&self, i: usize) -> T {
        self.freq_grid.get(i)
    }

    pub fn period(&self, i: usize) -> T {
        T::two() * T::PI() / self.freq(i)
    }

    pub fn power(&self, ts: &mut TimeSeries<T>) -> Vec<T> {
        power_direct(&self.freq_grid, ts)
    }
}
