//! Convenience re-exports for common tlib-core types.
//!
//! ```rust
//! use tlib_core::prelude::*;
//! ```

pub use crate::Engine;
pub use crate::EngineConfig;
pub use crate::Result;
pub use crate::Shape;
pub use crate::Tensor;
pub use crate::TensorHandle;
pub use crate::TlibError;
