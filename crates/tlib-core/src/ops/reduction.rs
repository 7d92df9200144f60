//! Reduction operations.

use crate::tensor::Tensor;

impl Tensor {
    /// Sum all elements.
    ///
    /// Accumulates strictly left to right from `0.0`, so the result for a
    /// given buffer is bit-for-bit reproducible.
    pub fn sum(&self) -> f32 {
        sum_slice(self.as_f32_slice())
    }

    /// Arithmetic mean of all elements.
    pub fn mean(&self) -> f32 {
        self.sum() / self.numel() as f32
    }
}

/// Sequential left-to-right sum of `data`.
pub fn sum_slice(data: &[f32]) -> f32 {
    data.iter().fold(0.0f32, |acc, &v| acc + v)
}
