//! Tensor operations: element-wise arithmetic and reductions.
//!
//! Operations that produce a result return a new tensor. The `_into` variants
//! write into an existing destination of identical shape.

pub mod arithmetic;
pub mod reduction;
