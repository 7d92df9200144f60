/// Errors produced by the tensor engine.
///
/// No operation partially mutates a tensor before returning one of these.
#[derive(Debug, thiserror::Error)]
pub enum TlibError {
    #[error("Allocation failed for {requested} f32 elements")]
    Allocation { requested: usize },

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid shape {shape:?}: need at least one dimension and all extents > 0")]
    InvalidShape { shape: Vec<usize> },

    #[error("Invalid or released tensor handle {0:#x}")]
    InvalidHandle(u64),

    #[error("Output sink error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TlibError {
    /// Whether this error means memory could not be obtained, as opposed to
    /// a usage error by the caller.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, TlibError::Allocation { .. })
    }
}
