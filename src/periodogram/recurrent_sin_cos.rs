use crate::float_trait::Float;

/// Infinite iterator of $(\sin\phi_k, \cos\phi_k)$ for $\phi_k = \phi_0 + k\,\delta\phi$
///
/// Every next pair is obtained by rotating the previous one by $\delta\phi$, so only two
/// trigonometric function calls are made. Round-off error grows linearly with $k$.
#[derive(Clone, Debug)]
pub struct RecurrentSinCos<T> {
    sin: T,
    cos: T,
    sin_step: T,
    cos_step: T,
}

impl<T: Float> RecurrentSinCos<T> {
    pub fn new(first: T, step: T) -> Self {
        let (sin, cos) = first.sin_cos();
        let (sin_step, cos_step) = step.sin_cos();
        Self {
            sin,
            cos,
            sin_step,
            cos_step,
        }
    }
}

impl<T: Float> Iterator for RecurrentSinCos<T> {
    type Item = (T, T);

    fn next(&mut self) -> Option<Self::Item> {
        let item = (self.sin, self.cos);
        let sin = self.sin * self.cos_step + self.cos * self.sin_step;
        let cos = self.cos * self.cos_step - self.sin * self.sin_step;
        self.sin = sin;
        self.cos = cos;
        Some(item)
    }
}
