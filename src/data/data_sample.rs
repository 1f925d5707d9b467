use crate::float_trait::Float;
use crate::types::CowArray1;

use ndarray::{Array1, ArrayView1};

/// A [`TimeSeries`](crate::TimeSeries) component
///
/// Mean and variance are evaluated lazily and cached, that's why getters require mutable
/// reference
#[derive(Clone, Debug)]
pub struct DataSample<'a, T>
where
    T: Float,
{
    pub sample: CowArray1<'a, T>,
    mean: Option<T>,
    std2: Option<T>,
}

impl<'a, T> DataSample<'a, T>
where
    T: Float,
{
    pub fn new(sample: CowArray1<'a, T>) -> Self {
        Self {
            sample,
            mean: None,
            std2: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// Contiguous values, a non-contiguous view is copied once
    pub fn as_slice(&mut self) -> &[T] {
        if !self.sample.is_standard_layout() {
            let owned: Array1<_> = self.sample.iter().copied().collect();
            self.sample = owned.into();
        }
        self.sample
            .as_slice()
            .unwrap_or_else(|| unreachable!("standard layout array is contiguous"))
    }

    /// Arithmetic mean, NaN for empty sample
    pub fn get_mean(&mut self) -> T {
        *self
            .mean
            .get_or_insert_with(|| self.sample.sum() / T::approx_from_usize(self.sample.len()))
    }

    /// Unbiased variance, NaN for less than two values
    pub fn get_std2(&mut self) -> T {
        if let Some(std2) = self.std2 {
            return std2;
        }
        let std2 = if self.len() < 2 {
            T::nan()
        } else {
            let mean = self.get_mean();
            self.sample
                .fold(T::zero(), |sum, &x| sum + (x - mean).powi(2))
                / T::approx_from_usize(self.len() - 1)
        };
        self.std2 = Some(std2);
        std2
    }
}

impl<'a, T, Slice: ?Sized> From<&'a Slice> for DataSample<'a, T>
where
    T: Float,
    Slice: AsRef<[T]>,
{
    fn from(s: &'a Slice) -> Self {
        ArrayView1::from(s.as_ref()).into()
    }
}

impl<T> From<Vec<T>> for DataSample<'_, T>
where
    T: Float,
{
    fn from(v: Vec<T>) -> Self {
        Array1::from(v).into()
    }
}

impl<'a, T> From<ArrayView1<'a, T>> for DataSample<'a, T>
where
    T: Float,
{
    fn from(a: ArrayView1<'a, T>) -> Self {
        Self::new(a.into())
    }
}

impl<T> From<Array1<T>> for DataSample<'_, T>
where
    T: Float,
{
    fn from(a: Array1<T>) -> Self {
        Self::new(a.into())
    }
}

impl<'a, T> From<CowArray1<'a, T>> for DataSample<'a, T>
where
    T: Float,
{
    fn from(a: CowArray1<'a, T>) -> Self {
        Self::new(a)
    }
}
