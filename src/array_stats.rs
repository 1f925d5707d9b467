//! Simple array statistics functions

use crate::float_trait::Float;

use ndarray::ArrayView1;

/// Find the index of the maximum element in an array
///
/// The first index is returned for repeated maximum values, NaN values are never selected unless
/// the array consists of NaN only.
pub fn argmax<T>(arr: ArrayView1<T>) -> Option<usize>
where
    T: Float,
{
    if arr.is_empty() {
        return None;
    }

    let (idx, _) = arr
        .iter()
        .enumerate()
        .fold((0, arr[0]), |(max_idx, max_val), (idx, &val)| {
            if val > max_val || (max_val.is_nan() && !val.is_nan()) {
                (idx, val)
            } else {
                (max_idx, max_val)
            }
        });

    Some(idx)
}

/// Mean of squared differences between two arrays of the same length
pub fn mean_squared_difference<T>(a: ArrayView1<T>, b: ArrayView1<T>) -> Option<T>
where
    T: Float,
{
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let sum = ndarray::Zip::from(&a)
        .and(&b)
        .fold(T::zero(), |acc, &x, &y| acc + (x - y).powi(2));
    Some(sum / T::approx_from_usize(a.len()))
}
