use crate::data::TimeSeries;
use crate::float_trait::Float;
use crate::periodogram::freq::LinearFreqGrid;
use crate::periodogram::recurrent_sin_cos::RecurrentSinCos;

/// Direct Lomb-Scargle periodogram
///
/// Asymptotic time is $O(N \times N_\omega)$. The power is normalised by the magnitude variance,
/// zero-variance time series have zero power everywhere.
///
/// The implementation is inspired by Numerical Recipes, Press et al., 1997, Section 13.8
pub fn power_direct<T: Float>(freq: &LinearFreqGrid<T>, ts: &mut TimeSeries<T>) -> Vec<T> {
    let m_mean = ts.m.get_mean();
    let m_std2 = ts.m.get_std2();
    let n = ts.lenf();

    let t = ts.t.as_slice().to_vec();
    let m = ts.m.as_slice();

    let sin_cos_omega_tau = SinCosOmegaTau::new(freq, &t);
    let mut sin_cos_omega_x: Vec<_> = t.iter().map(|&x| freq.iter_sin_cos_mul(x)).collect();

    sin_cos_omega_tau
        .take(freq.size())
        .map(|(sin_omega_tau, cos_omega_tau)| {
            let mut sum_m_sin = T::zero();
            let mut sum_m_cos = T::zero();
            let mut sum_sin2 = T::zero();
            for (s_c_omega_x, &y) in sin_cos_omega_x.iter_mut().zip(m.iter()) {
                let (sin_omega_x, cos_omega_x) = next_sin_cos(s_c_omega_x);
                // sine and cosine of omega * (x - tau)
                let sin = sin_omega_x * cos_omega_tau - cos_omega_x * sin_omega_tau;
                let cos = cos_omega_x * cos_omega_tau + sin_omega_x * sin_omega_tau;
                sum_m_sin += (y - m_mean) * sin;
                sum_m_cos += (y - m_mean) * cos;
                sum_sin2 += sin.powi(2);
            }
            let sum_cos2 = n - sum_sin2;

            if (sum_m_sin.is_zero() & sum_sin2.is_zero())
                | (sum_m_cos.is_zero() & sum_cos2.is_zero())
                | m_std2.is_zero()
                | !m_std2.is_finite()
            {
                T::zero()
            } else {
                T::half() * (sum_m_sin.powi(2) / sum_sin2 + sum_m_cos.powi(2) / sum_cos2) / m_std2
            }
        })
        .collect()
}

/// [RecurrentSinCos] is infinite
#[inline]
fn next_sin_cos<T: Float>(iter: &mut RecurrentSinCos<T>) -> (T, T) {
    iter.next().unwrap_or_else(|| unreachable!())
}

struct SinCosOmegaTau<T> {
    sin_cos_2omega_x: Vec<RecurrentSinCos<T>>,
}

impl<T: Float> SinCosOmegaTau<T> {
    fn new(freq_grid: &LinearFreqGrid<T>, t: &[T]) -> Self {
        let sin_cos_2omega_x = t
            .iter()
            .map(|&x| freq_grid.iter_sin_cos_mul(T::two() * x))
            .collect();
        Self { sin_cos_2omega_x }
    }
}

impl<T: Float> Iterator for SinCosOmegaTau<T> {
    type Item = (T, T);

    fn next(&mut self) -> Option<Self::Item> {
        let mut sum_sin = T::zero();
        let mut sum_cos = T::zero();
        for s_c in &mut self.sin_cos_2omega_x {
            let (sin, cos) = next_sin_cos(s_c);
            sum_sin += sin;
            sum_cos += cos;
        }
        let cos2 = sum_cos / T::hypot(sum_sin, sum_cos);
        let sin = T::signum(sum_sin) * T::sqrt(T::half() * (T::one() - cos2));
        let cos = T::sqrt(T::half() * (T::one() + cos2));
        Some((sin, cos))
    }
}
