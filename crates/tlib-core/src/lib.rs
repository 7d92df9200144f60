//! # tlib-core
//!
//! Minimal dense tensor engine.
//!
//! Provides:
//! - `Tensor`: an owned, contiguous f32 buffer plus an immutable `Shape`
//! - Element-wise `add` and `multiply` (Hadamard) with exact shape matching
//! - Left-to-right `sum`, `fill`, uniform `randomize`, `set_data`
//! - `Engine`: an arena addressing tensors through opaque `TensorHandle`s
//!   with explicit create/destroy lifetimes
//!
//! Everything runs synchronously on the caller's thread.

pub mod config;
pub mod engine;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod random;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use config::EngineConfig;
pub use engine::{Engine, TensorHandle};
pub use error::TlibError;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, TlibError>;
