use std::fmt;
use std::io::{self, Write};

use rand::Rng;

use crate::random;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A dense, row-major f32 tensor.
///
/// A tensor exclusively owns its data and shape. The shape never changes after
/// construction; only `fill`, `randomize` and `set_data` mutate the data, and
/// they do so in place.
///
/// # Examples
///
/// ```
/// use tlib_core::Tensor;
///
/// let mut t = Tensor::zeros(&[2, 3]).unwrap();
/// t.set_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(t.shape().dims(), &[2, 3]);
/// assert_eq!(t.numel(), 6);
/// assert_eq!(t.sum(), 21.0);
/// ```
#[derive(Clone, PartialEq)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a zero-filled tensor with the given shape.
    pub fn zeros(shape: &[usize]) -> Result<Self> {
        let shape = Shape::new(shape)?;
        Self::zeros_like_shape(&shape)
    }

    pub(crate) fn zeros_like_shape(shape: &Shape) -> Result<Self> {
        Ok(Self {
            storage: Storage::zeros(shape.numel())?,
            shape: shape.clone(),
        })
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: &[usize], value: f32) -> Result<Self> {
        let mut t = Self::zeros(shape)?;
        t.fill(value);
        Ok(t)
    }

    /// Create a tensor by copying `data` into a fresh buffer of the given shape.
    pub fn from_f32(data: &[f32], shape: &[usize]) -> Result<Self> {
        let mut t = Self::zeros(shape)?;
        t.set_data(data)?;
        Ok(t)
    }

    /// Create a tensor that takes ownership of `data`.
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let shape = Shape::new(shape)?;
        if data.len() != shape.numel() {
            return Err(crate::TlibError::ShapeMismatch {
                expected: vec![shape.numel()],
                got: vec![data.len()],
            });
        }
        Ok(Self {
            storage: Storage::from_vec(data),
            shape,
        })
    }

    /// Create a tensor with values drawn uniformly from [0, 1).
    pub fn rand(shape: &[usize]) -> Result<Self> {
        let mut t = Self::zeros(shape)?;
        t.randomize();
        Ok(t)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn storage_ref(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    // =========================================================================
    // Data access
    // =========================================================================

    pub fn as_f32_slice(&self) -> &[f32] {
        self.storage.as_slice()
    }

    /// Get a single element by flat (row-major) index.
    pub fn get_f32(&self, flat_index: usize) -> Option<f32> {
        self.storage.as_slice().get(flat_index).copied()
    }

    /// Split into the owned data buffer and the shape.
    pub fn into_parts(self) -> (Box<[f32]>, Shape) {
        (self.storage.into_boxed_slice(), self.shape)
    }

    // =========================================================================
    // In-place mutation
    // =========================================================================

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: f32) {
        self.storage.as_mut_slice().fill(value);
    }

    /// Overwrite every element with a sample from U[0, 1) taken from the
    /// process-wide generator.
    pub fn randomize(&mut self) {
        random::fill_uniform(self.storage.as_mut_slice());
    }

    /// Overwrite every element with a sample from U[0, 1) taken from `rng`.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        random::fill_uniform_with(rng, self.storage.as_mut_slice());
    }

    /// Copy `values` into the tensor. The length must equal `numel()`;
    /// otherwise the tensor is left unchanged.
    pub fn set_data(&mut self, values: &[f32]) -> Result<()> {
        self.storage.copy_from(values)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Write the two-line rendering of shape and data to `w`.
    ///
    /// ```text
    /// Tensor shape: (2, 2)
    /// Data: 1.00 2.00 3.00 4.00
    /// ```
    pub fn write_to<W: Write + ?Sized>(
        &self,
        w: &mut W,
        precision: usize,
        max_elements: Option<usize>,
    ) -> io::Result<()> {
        write_rendering(w, &self.shape, self.as_f32_slice(), precision, max_elements)
    }

    /// Render with the given precision into a `String`.
    pub fn render(&self, precision: usize, max_elements: Option<usize>) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec<u8> cannot fail.
        let _ = self.write_to(&mut buf, precision, max_elements);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Print to standard output with two decimals.
    pub fn print(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.write_to(&mut lock, 2, None)
    }
}

/// Write the shape/data rendering for a buffer that is not held in a
/// `Tensor` (the C ABI keeps its buffers in raw form).
pub fn write_rendering<W: Write + ?Sized>(
    w: &mut W,
    shape: &Shape,
    data: &[f32],
    precision: usize,
    max_elements: Option<usize>,
) -> io::Result<()> {
    writeln!(w, "Tensor shape: {}", shape)?;
    write!(w, "Data:")?;
    let shown = max_elements.map_or(data.len(), |m| m.min(data.len()));
    for v in &data[..shown] {
        write!(w, " {:.*}", precision, v)?;
    }
    if shown < data.len() {
        write!(w, " ... ({} more)", data.len() - shown)?;
    }
    writeln!(w)
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, numel={})", self.shape, self.numel())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.as_f32_slice();
        if self.numel() <= 20 {
            write!(f, "tensor({:?}, shape={})", data, self.shape)
        } else {
            write!(
                f,
                "tensor([{:.4}, {:.4}, ..., {:.4}], shape={})",
                data[0],
                data[1],
                data[self.numel() - 1],
                self.shape
            )
        }
    }
}
