//! Element-wise arithmetic operations on tensors.
//!
//! Binary operations require exactly equal shapes. There is no broadcasting,
//! and `multiply` is the Hadamard product, not matrix multiplication.

use crate::error::TlibError;
use crate::tensor::Tensor;
use crate::Result;

impl Tensor {
    /// Element-wise addition: `out[i] = self[i] + other[i]`.
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a + b)
    }

    /// Element-wise (Hadamard) product: `out[i] = self[i] * other[i]`.
    pub fn multiply(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a * b)
    }

    /// Element-wise addition written into `dst`.
    ///
    /// `self`, `other` and `dst` must share one shape. On error `dst` is not
    /// touched.
    pub fn add_into(&self, other: &Tensor, dst: &mut Tensor) -> Result<()> {
        binary_op_into(self, other, dst, |a, b| a + b)
    }

    /// Hadamard product written into `dst`, with the same contract as `add_into`.
    pub fn multiply_into(&self, other: &Tensor, dst: &mut Tensor) -> Result<()> {
        binary_op_into(self, other, dst, |a, b| a * b)
    }

    /// Element-wise exponential: e^self.
    pub fn exp(&self) -> Result<Tensor> {
        unary_op(self, |a| a.exp())
    }

    /// Element-wise natural logarithm.
    pub fn log(&self) -> Result<Tensor> {
        unary_op(self, |a| a.ln())
    }
}

/// Apply `op` pairwise over `a` and `b`, writing into `out`.
///
/// All three slices must have the same length; nothing is written otherwise.
pub fn zip_map_into(
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    op: impl Fn(f32, f32) -> f32,
) -> Result<()> {
    if a.len() != b.len() || a.len() != out.len() {
        return Err(TlibError::ShapeMismatch {
            expected: vec![a.len()],
            got: vec![if a.len() != b.len() { b.len() } else { out.len() }],
        });
    }
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = op(x, y);
    }
    Ok(())
}

fn unary_op(a: &Tensor, op: impl Fn(f32) -> f32) -> Result<Tensor> {
    let mut out = Tensor::zeros_like_shape(a.shape())?;
    let dst = out.storage_mut().as_mut_slice();
    for (o, &x) in dst.iter_mut().zip(a.as_f32_slice()) {
        *o = op(x);
    }
    Ok(out)
}

fn binary_op(a: &Tensor, b: &Tensor, op: impl Fn(f32, f32) -> f32) -> Result<Tensor> {
    a.shape().ensure_same(b.shape())?;
    let mut out = Tensor::zeros_like_shape(a.shape())?;
    zip_map_into(
        a.as_f32_slice(),
        b.as_f32_slice(),
        out.storage_mut().as_mut_slice(),
        op,
    )?;
    Ok(out)
}

fn binary_op_into(
    a: &Tensor,
    b: &Tensor,
    dst: &mut Tensor,
    op: impl Fn(f32, f32) -> f32,
) -> Result<()> {
    a.shape().ensure_same(b.shape())?;
    a.shape().ensure_same(dst.shape())?;
    zip_map_into(
        a.as_f32_slice(),
        b.as_f32_slice(),
        dst.storage_mut().as_mut_slice(),
        op,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(data: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_f32(data, shape).unwrap()
    }

    #[test]
    fn test_add() {
        let a = t(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = t(&[5.0, 6.0, 7.0, 8.0], &[2, 2]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.as_f32_slice(), &[6.0, 8.0, 10.0, 12.0]);
        assert_eq!(c.shape().dims(), &[2, 2]);
    }

    #[test]
    fn test_multiply_is_hadamard() {
        let a = t(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = t(&[5.0, 6.0, 7.0, 8.0], &[2, 2]);
        let c = a.multiply(&b).unwrap();
        // [[1,2],[3,4]] @ [[5,6],[7,8]] would be [19,22,43,50]
        assert_eq!(c.as_f32_slice(), &[5.0, 12.0, 21.0, 32.0]);
    }

    #[test]
    fn test_no_broadcasting() {
        let a = t(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let row = t(&[1.0, 1.0, 1.0], &[3]);
        assert!(matches!(a.add(&row), Err(TlibError::ShapeMismatch { .. })));

        let one = t(&[1.0], &[1]);
        assert!(a.multiply(&one).is_err());
    }

    #[test]
    fn test_add_into_mismatch_leaves_destination() {
        let a = t(&[1.0; 6], &[2, 3]);
        let b = t(&[2.0; 6], &[3, 2]);
        let mut dst = t(&[9.0; 6], &[2, 3]);
        let err = a.add_into(&b, &mut dst).unwrap_err();
        assert!(matches!(err, TlibError::ShapeMismatch { .. }));
        assert_eq!(dst.as_f32_slice(), &[9.0; 6]);

        // operands agree but destination does not
        let mut wrong_dst = t(&[9.0; 6], &[6]);
        assert!(a.add_into(&a, &mut wrong_dst).is_err());
        assert_eq!(wrong_dst.as_f32_slice(), &[9.0; 6]);
    }

    #[test]
    fn test_multiply_into() {
        let a = t(&[1.0, 2.0, 3.0], &[3]);
        let b = t(&[4.0, 5.0, 6.0], &[3]);
        let mut dst = Tensor::zeros(&[3]).unwrap();
        a.multiply_into(&b, &mut dst).unwrap();
        assert_eq!(dst.as_f32_slice(), &[4.0, 10.0, 18.0]);
    }

    #[test]
    fn test_exp_log() {
        let a = t(&[0.0, 1.0, 2.0], &[3]);
        let e = a.exp().unwrap();
        let back = e.log().unwrap();
        for (x, y) in back.as_f32_slice().iter().zip(a.as_f32_slice()) {
            assert!((x - y).abs() < 1e-6);
        }
        assert_eq!(e.get_f32(0), Some(1.0));
    }

    #[test]
    fn test_zip_map_into_length_check() {
        let mut out = [0.0f32; 2];
        assert!(zip_map_into(&[1.0, 2.0], &[1.0], &mut out, |a, b| a + b).is_err());
        assert_eq!(out, [0.0, 0.0]);
    }
}
