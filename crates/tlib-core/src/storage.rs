use crate::error::TlibError;
use crate::Result;

/// Backing storage for tensor data.
///
/// Storage exclusively owns a contiguous f32 buffer. It is never shared
/// between tensors; `Clone` performs a deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    data: Vec<f32>,
}

impl Storage {
    /// Allocate zeroed storage for `numel` elements.
    ///
    /// Allocation goes through `try_reserve_exact`, so an oversized request
    /// surfaces as `TlibError::Allocation` instead of aborting the process.
    pub fn zeros(numel: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(numel)
            .map_err(|_| TlibError::Allocation { requested: numel })?;
        data.resize(numel, 0.0);
        Ok(Self { data })
    }

    /// Take ownership of an existing buffer.
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Overwrite the whole buffer from `values`; lengths must match.
    pub fn copy_from(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(TlibError::ShapeMismatch {
                expected: vec![self.data.len()],
                got: vec![values.len()],
            });
        }
        self.data.copy_from_slice(values);
        Ok(())
    }

    /// Give up the buffer as a boxed slice (used when handing memory across
    /// the C boundary).
    pub fn into_boxed_slice(self) -> Box<[f32]> {
        self.data.into_boxed_slice()
    }
}
