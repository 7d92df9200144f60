//! Handle-based tensor arena.
//!
//! `Engine` owns every tensor it creates and hands out opaque
//! `TensorHandle`s. Lifetimes are manual: each successful `create` (or any
//! other operation returning a handle) must be matched by exactly one
//! `destroy`. Destroying a handle twice is a caller bug; the arena reports it
//! as `InvalidHandle` because slots are generation-tagged, but callers must
//! not rely on that.
//!
//! The engine does no internal locking. Confine it to one thread or wrap it
//! in a caller-supplied mutex.

use std::fmt;
use std::io::{self, Write};

use crate::config::EngineConfig;
use crate::error::TlibError;
use crate::random;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::Result;

/// Opaque reference to a tensor owned by an `Engine`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorHandle(u64);

impl TensorHandle {
    fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    fn index(self) -> usize {
        (self.0 & 0xffff_ffff) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw value, for passing across a boundary and back.
    pub fn to_raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for TensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TensorHandle({:#x})", self.0)
    }
}

struct Slot {
    generation: u32,
    tensor: Option<Tensor>,
}

fn lookup(slots: &[Slot], handle: TensorHandle) -> Result<&Tensor> {
    slots
        .get(handle.index())
        .filter(|s| s.generation == handle.generation())
        .and_then(|s| s.tensor.as_ref())
        .ok_or(TlibError::InvalidHandle(handle.0))
}

/// Arena of tensors addressed by `TensorHandle`.
pub struct Engine {
    slots: Vec<Slot>,
    free: Vec<u32>,
    config: EngineConfig,
    sink: Box<dyn Write + Send>,
}

impl Engine {
    /// Build an engine that prints to standard output.
    ///
    /// If `config.seed` is set the process-wide RNG is reseeded here.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Box::new(io::stdout()))
    }

    /// Build an engine that prints to `sink`.
    pub fn with_sink(config: EngineConfig, sink: Box<dyn Write + Send>) -> Self {
        if let Some(seed) = config.seed {
            random::seed_global(seed);
        }
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            config,
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of tensors currently alive in the arena.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Allocate a zero-filled tensor of the given shape.
    pub fn create(&mut self, shape: &[usize]) -> Result<TensorHandle> {
        let tensor = Tensor::zeros(shape)?;
        Ok(self.insert(tensor))
    }

    /// Allocate a tensor and copy `values` into it.
    pub fn create_from(&mut self, values: &[f32], shape: &[usize]) -> Result<TensorHandle> {
        let tensor = Tensor::from_f32(values, shape)?;
        Ok(self.insert(tensor))
    }

    /// Move an existing tensor into the arena.
    pub fn insert(&mut self, tensor: Tensor) -> TensorHandle {
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.tensor = Some(tensor);
                TensorHandle::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    tensor: Some(tensor),
                });
                TensorHandle::new(index, 0)
            }
        };
        tracing::debug!(?handle, live = self.live_count(), "tensor created");
        handle
    }

    /// Release a tensor and free both its buffers.
    pub fn destroy(&mut self, handle: TensorHandle) -> Result<()> {
        self.take(handle).map(drop)
    }

    /// Remove a tensor from the arena and return it to the caller.
    pub fn take(&mut self, handle: TensorHandle) -> Result<Tensor> {
        lookup(&self.slots, handle)?;
        let index = handle.index();
        let slot = &mut self.slots[index];
        let tensor = slot.tensor.take().ok_or(TlibError::InvalidHandle(handle.0))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        tracing::debug!(?handle, live = self.live_count(), "tensor destroyed");
        Ok(tensor)
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn get(&self, handle: TensorHandle) -> Result<&Tensor> {
        lookup(&self.slots, handle)
    }

    pub fn get_mut(&mut self, handle: TensorHandle) -> Result<&mut Tensor> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.tensor.as_mut())
            .ok_or(TlibError::InvalidHandle(handle.0))
    }

    pub fn shape(&self, handle: TensorHandle) -> Result<&Shape> {
        Ok(self.get(handle)?.shape())
    }

    pub fn size(&self, handle: TensorHandle) -> Result<usize> {
        Ok(self.get(handle)?.numel())
    }

    pub fn ndim(&self, handle: TensorHandle) -> Result<usize> {
        Ok(self.get(handle)?.ndim())
    }

    pub fn data(&self, handle: TensorHandle) -> Result<&[f32]> {
        Ok(self.get(handle)?.as_f32_slice())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub fn fill(&mut self, handle: TensorHandle, value: f32) -> Result<()> {
        self.get_mut(handle)?.fill(value);
        Ok(())
    }

    pub fn randomize(&mut self, handle: TensorHandle) -> Result<()> {
        self.get_mut(handle)?.randomize();
        Ok(())
    }

    pub fn set_data(&mut self, handle: TensorHandle, values: &[f32]) -> Result<()> {
        self.get_mut(handle)?.set_data(values)
    }

    // =========================================================================
    // Computation
    // =========================================================================

    /// Element-wise sum into a new tensor.
    pub fn add(&mut self, a: TensorHandle, b: TensorHandle) -> Result<TensorHandle> {
        let out = self.get(a)?.add(self.get(b)?)?;
        Ok(self.insert(out))
    }

    /// Element-wise (Hadamard) product into a new tensor.
    pub fn multiply(&mut self, a: TensorHandle, b: TensorHandle) -> Result<TensorHandle> {
        let out = self.get(a)?.multiply(self.get(b)?)?;
        Ok(self.insert(out))
    }

    /// Element-wise sum written into `dst`. `dst` may alias `a` or `b`.
    /// On error `dst` keeps its previous content.
    pub fn add_into(&mut self, a: TensorHandle, b: TensorHandle, dst: TensorHandle) -> Result<()> {
        self.binary_into(a, b, dst, Tensor::add)
    }

    /// Hadamard product written into `dst`, same contract as `add_into`.
    pub fn multiply_into(
        &mut self,
        a: TensorHandle,
        b: TensorHandle,
        dst: TensorHandle,
    ) -> Result<()> {
        self.binary_into(a, b, dst, Tensor::multiply)
    }

    fn binary_into(
        &mut self,
        a: TensorHandle,
        b: TensorHandle,
        dst: TensorHandle,
        op: fn(&Tensor, &Tensor) -> Result<Tensor>,
    ) -> Result<()> {
        let out = {
            let (ta, tb, td) = (self.get(a)?, self.get(b)?, self.get(dst)?);
            ta.shape().ensure_same(tb.shape())?;
            ta.shape().ensure_same(td.shape())?;
            op(ta, tb)?
        };
        *self.get_mut(dst)? = out;
        Ok(())
    }

    pub fn exp(&mut self, handle: TensorHandle) -> Result<TensorHandle> {
        let out = self.get(handle)?.exp()?;
        Ok(self.insert(out))
    }

    pub fn log(&mut self, handle: TensorHandle) -> Result<TensorHandle> {
        let out = self.get(handle)?.log()?;
        Ok(self.insert(out))
    }

    pub fn sum(&self, handle: TensorHandle) -> Result<f32> {
        Ok(self.get(handle)?.sum())
    }

    /// Write the shape/data rendering to the engine's sink.
    pub fn print(&mut self, handle: TensorHandle) -> Result<()> {
        let tensor = lookup(&self.slots, handle)?;
        tensor.write_to(
            &mut self.sink,
            self.config.print_precision,
            self.config.max_print_elements,
        )?;
        self.sink.flush()?;
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("live", &self.live_count())
            .field("config", &self.config)
            .finish()
    }
}
