use smallvec::SmallVec;
use std::fmt;

use crate::error::TlibError;
use crate::Result;

/// Tensor shape with stack-allocated storage for ≤4 dimensions.
///
/// A valid shape has at least one dimension and every extent is positive,
/// so `numel()` is always ≥ 1. Shapes are immutable once built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
    numel: usize,
}

impl Shape {
    /// Validate dimensions and build a shape.
    ///
    /// Fails with `InvalidShape` for zero dimensions or a zero extent, and with
    /// `Allocation` when the element count does not fit in `usize`.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.contains(&0) {
            return Err(TlibError::InvalidShape {
                shape: dims.to_vec(),
            });
        }
        let numel = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(TlibError::Allocation {
                requested: usize::MAX,
            })?;
        Ok(Self {
            dims: SmallVec::from_slice(dims),
            numel,
        })
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Require exact equality with `other`. No broadcasting.
    pub fn ensure_same(&self, other: &Shape) -> Result<()> {
        if self != other {
            return Err(TlibError::ShapeMismatch {
                expected: self.dims.to_vec(),
                got: other.dims.to_vec(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TlibError;

    fn try_from(dims: &[usize]) -> Result<Self> {
        Shape::new(dims)
    }
}
