use crate::float_trait::Float;

use ndarray::Array1;

/// Fit input: time, values and inverse uncertainties
#[derive(Clone, Debug)]
pub struct Data<T> {
    pub t: Array1<T>,
    pub m: Array1<T>,
    pub inv_err: Array1<T>,
}

impl<T> Data<T>
where
    T: Float,
{
    /// Every point has unit weight
    pub fn unweighted(t: Array1<T>, m: Array1<T>) -> Self {
        let inv_err = Array1::ones(t.len());
        Self { t, m, inv_err }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}
