use crate::data::data_sample::DataSample;
use crate::float_trait::Float;

/// Single-band light curve of a single object
///
/// Magnitude statistics are cached, so periodogram evaluation requires a mutable reference
#[derive(Clone, Debug)]
pub struct TimeSeries<'a, T>
where
    T: Float,
{
    /// Time
    pub t: DataSample<'a, T>,
    /// Magnitude or flux
    pub m: DataSample<'a, T>,
    /// Uncertainty of `m`
    pub err: DataSample<'a, T>,
}

impl<'a, T> TimeSeries<'a, T>
where
    T: Float,
{
    /// Construct `TimeSeries` from array-like objects
    ///
    /// `t` is time, `m` is magnitude (or flux), `err` is observation error of `m`.
    ///
    /// All arrays must have the same length, `t` is expected to increase monotonically. Input
    /// arrays could be [`ndarray::Array1`], [`ndarray::ArrayView1`], 1-D [`ndarray::CowArray`],
    /// [Vec] or `&[T]`.
    pub fn new(
        t: impl Into<DataSample<'a, T>>,
        m: impl Into<DataSample<'a, T>>,
        err: impl Into<DataSample<'a, T>>,
    ) -> Self {
        let t = t.into();
        let m = m.into();
        let err = err.into();

        assert_eq!(t.len(), m.len(), "t and m should have the same size");
        assert_eq!(m.len(), err.len(), "m and err should have the same size");

        Self { t, m, err }
    }

    /// Time series length
    #[inline]
    pub fn lenu(&self) -> usize {
        self.t.len()
    }

    /// Float approximating time series length
    pub fn lenf(&self) -> T {
        T::approx_from_usize(self.lenu())
    }
}
