//! # tlib-ffi
//!
//! C ABI for the tlib tensor engine, loadable as `tensor_lib.so` from ctypes
//! or any C caller.
//!
//! ```c
//! int shape[2] = {2, 2};
//! CTensor* a = create_tensor(shape, 2);
//! CTensor* b = create_tensor(shape, 2);
//! CTensor* c = create_tensor(shape, 2);
//! tensor_set_data(a, (float[]){1, 2, 3, 4}, 4);
//! tensor_set_data(b, (float[]){5, 6, 7, 8}, 4);
//! tensor_add(a, b, c);   // c = [6, 8, 10, 12]
//! print_tensor(c);
//! free_tensor(c); free_tensor(b); free_tensor(a);
//! ```
//!
//! Every `create_tensor` that returns non-null must be paired with exactly
//! one `free_tensor`. Operations returning `c_int` report one of the
//! `TLIB_*` status codes and never partially modify their output.

use std::io::{self, Write};
use std::os::raw::c_int;
use std::ptr;

use tlib_core::ops::arithmetic::zip_map_into;
use tlib_core::ops::reduction::sum_slice;
use tlib_core::tensor::write_rendering;
use tlib_core::{random, Shape, Tensor, TlibError};

pub const TLIB_OK: c_int = 0;
pub const TLIB_ERR_NULL: c_int = 1;
pub const TLIB_ERR_ALLOCATION: c_int = 2;
pub const TLIB_ERR_SHAPE_MISMATCH: c_int = 3;
pub const TLIB_ERR_INVALID_SHAPE: c_int = 4;
pub const TLIB_ERR_IO: c_int = 5;

/// Tensor record shared with C callers.
///
/// The field order is part of the ABI: callers read `data`, `shape`, `ndim`
/// and `size` directly from the struct.
#[repr(C)]
#[derive(Debug)]
pub struct CTensor {
    pub data: *mut f32,
    pub shape: *mut c_int,
    pub ndim: c_int,
    pub size: c_int,
}

/// Map an engine error to its status code.
pub fn status_of(err: &TlibError) -> c_int {
    match err {
        TlibError::Allocation { .. } => TLIB_ERR_ALLOCATION,
        TlibError::ShapeMismatch { .. } => TLIB_ERR_SHAPE_MISMATCH,
        TlibError::InvalidShape { .. } => TLIB_ERR_INVALID_SHAPE,
        TlibError::InvalidHandle(_) => TLIB_ERR_NULL,
        TlibError::Io(_) | TlibError::Config(_) => TLIB_ERR_IO,
    }
}

fn fail(op: &str, err: TlibError) -> c_int {
    tracing::warn!(op, error = %err, "tensor operation failed");
    status_of(&err)
}

unsafe fn dims_of(t: &CTensor) -> &[c_int] {
    std::slice::from_raw_parts(t.shape, t.ndim as usize)
}

unsafe fn data_of<'a>(t: *const CTensor) -> &'a [f32] {
    std::slice::from_raw_parts((*t).data, (*t).size as usize)
}

unsafe fn data_mut_of<'a>(t: *mut CTensor) -> &'a mut [f32] {
    std::slice::from_raw_parts_mut((*t).data, (*t).size as usize)
}

/// Rebuild the engine `Shape` from the C record.
unsafe fn shape_of(t: *const CTensor) -> Result<Shape, TlibError> {
    let dims: Vec<usize> = dims_of(&*t).iter().map(|&d| d.max(0) as usize).collect();
    Shape::new(&dims)
}

unsafe fn alloc_tensor(shape: *const c_int, ndim: c_int) -> Result<*mut CTensor, TlibError> {
    let c_dims = std::slice::from_raw_parts(shape, ndim as usize);
    if c_dims.iter().any(|&d| d <= 0) {
        return Err(TlibError::InvalidShape {
            shape: c_dims.iter().map(|&d| d.max(0) as usize).collect(),
        });
    }
    let dims: Vec<usize> = c_dims.iter().map(|&d| d as usize).collect();

    // `size` is a c_int field, so reject oversized counts before allocating.
    let numel = Shape::new(&dims)?.numel();
    let size = c_int::try_from(numel).map_err(|_| TlibError::Allocation { requested: numel })?;
    let (data, _) = Tensor::zeros(&dims)?.into_parts();

    let shape_buf: Box<[c_int]> = c_dims.to_vec().into_boxed_slice();
    Ok(Box::into_raw(Box::new(CTensor {
        data: Box::into_raw(data) as *mut f32,
        shape: Box::into_raw(shape_buf) as *mut c_int,
        ndim,
        size,
    })))
}

/// Allocate a zero-filled tensor and store it in `*out`.
///
/// Returns `TLIB_ERR_NULL` for a null `shape` or `out`,
/// `TLIB_ERR_INVALID_SHAPE` for `ndim < 1` or a non-positive extent, and
/// `TLIB_ERR_ALLOCATION` when the element count does not fit in `c_int` or
/// the allocator refuses the buffer. On failure `*out` is set to null.
///
/// # Safety
/// `shape` must point to `ndim` readable `c_int`s and `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn create_tensor_checked(
    shape: *const c_int,
    ndim: c_int,
    out: *mut *mut CTensor,
) -> c_int {
    if out.is_null() {
        return TLIB_ERR_NULL;
    }
    *out = ptr::null_mut();
    if shape.is_null() {
        tracing::warn!(ndim, "create_tensor: null shape");
        return TLIB_ERR_NULL;
    }
    if ndim < 1 {
        return fail("create_tensor", TlibError::InvalidShape { shape: Vec::new() });
    }
    match alloc_tensor(shape, ndim) {
        Ok(t) => {
            *out = t;
            TLIB_OK
        }
        Err(e) => fail("create_tensor", e),
    }
}

/// Allocate a zero-filled tensor. Returns null on any failure; use
/// `create_tensor_checked` to learn which one.
///
/// # Safety
/// `shape` must point to `ndim` readable `c_int`s.
#[no_mangle]
pub unsafe extern "C" fn create_tensor(shape: *const c_int, ndim: c_int) -> *mut CTensor {
    let mut t = ptr::null_mut();
    create_tensor_checked(shape, ndim, &mut t);
    t
}

/// Free a tensor and both of its buffers. Null is a no-op.
///
/// # Safety
/// `tensor` must come from `create_tensor` and must not be freed twice;
/// a second call on the same pointer is undefined behaviour.
#[no_mangle]
pub unsafe extern "C" fn free_tensor(tensor: *mut CTensor) {
    if tensor.is_null() {
        return;
    }
    let t = Box::from_raw(tensor);
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(t.data, t.size as usize)));
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(t.shape, t.ndim as usize)));
}

/// Copy `count` floats from `values` into the tensor.
///
/// # Safety
/// `tensor` must be live; `values` must point to `count` readable floats.
#[no_mangle]
pub unsafe extern "C" fn tensor_set_data(
    tensor: *mut CTensor,
    values: *const f32,
    count: c_int,
) -> c_int {
    if tensor.is_null() || values.is_null() {
        return TLIB_ERR_NULL;
    }
    if count != (*tensor).size {
        return fail(
            "tensor_set_data",
            TlibError::ShapeMismatch {
                expected: vec![(*tensor).size as usize],
                got: vec![count.max(0) as usize],
            },
        );
    }
    let src = std::slice::from_raw_parts(values, count as usize);
    data_mut_of(tensor).copy_from_slice(src);
    TLIB_OK
}

/// Set every element to `value`.
///
/// # Safety
/// `tensor` must be live.
#[no_mangle]
pub unsafe extern "C" fn tensor_fill(tensor: *mut CTensor, value: f32) -> c_int {
    if tensor.is_null() {
        return TLIB_ERR_NULL;
    }
    data_mut_of(tensor).fill(value);
    TLIB_OK
}

/// Fill with samples from U[0, 1) drawn from the process-wide generator.
///
/// # Safety
/// `tensor` must be live.
#[no_mangle]
pub unsafe extern "C" fn tensor_random(tensor: *mut CTensor) -> c_int {
    if tensor.is_null() {
        return TLIB_ERR_NULL;
    }
    random::fill_uniform(data_mut_of(tensor));
    TLIB_OK
}

/// Reseed the process-wide generator used by `tensor_random`.
#[no_mangle]
pub extern "C" fn tensor_seed(seed: u64) {
    random::seed_global(seed);
}

unsafe fn binary_into(
    op_name: &str,
    a: *const CTensor,
    b: *const CTensor,
    result: *mut CTensor,
    op: fn(f32, f32) -> f32,
) -> c_int {
    if a.is_null() || b.is_null() || result.is_null() {
        return TLIB_ERR_NULL;
    }
    let checked = shape_of(a).and_then(|sa| {
        sa.ensure_same(&shape_of(b)?)?;
        sa.ensure_same(&shape_of(result)?)?;
        Ok(sa)
    });
    let shape = match checked {
        Ok(s) => s,
        Err(e) => return fail(op_name, e),
    };

    // `result` may alias an operand, so finish reading before writing.
    let mut out = vec![0.0f32; shape.numel()];
    if let Err(e) = zip_map_into(data_of(a), data_of(b), &mut out, op) {
        return fail(op_name, e);
    }
    data_mut_of(result).copy_from_slice(&out);
    TLIB_OK
}

/// `result[i] = a[i] + b[i]`. All three shapes must be equal; on mismatch
/// `result` is left untouched and `TLIB_ERR_SHAPE_MISMATCH` is returned.
///
/// # Safety
/// All pointers must be live tensors.
#[no_mangle]
pub unsafe extern "C" fn tensor_add(
    a: *const CTensor,
    b: *const CTensor,
    result: *mut CTensor,
) -> c_int {
    binary_into("tensor_add", a, b, result, |x, y| x + y)
}

/// `result[i] = a[i] * b[i]` (Hadamard product, not matrix multiplication).
/// Same contract as `tensor_add`.
///
/// # Safety
/// All pointers must be live tensors.
#[no_mangle]
pub unsafe extern "C" fn tensor_multiply(
    a: *const CTensor,
    b: *const CTensor,
    result: *mut CTensor,
) -> c_int {
    binary_into("tensor_multiply", a, b, result, |x, y| x * y)
}

/// Left-to-right sum of all elements, written to `out`.
///
/// # Safety
/// `tensor` must be live and `out` writable.
#[no_mangle]
pub unsafe extern "C" fn tensor_sum(tensor: *const CTensor, out: *mut f32) -> c_int {
    if tensor.is_null() || out.is_null() {
        return TLIB_ERR_NULL;
    }
    *out = sum_slice(data_of(tensor));
    TLIB_OK
}

/// Print shape and data to standard output.
///
/// # Safety
/// `tensor` must be null or live.
#[no_mangle]
pub unsafe extern "C" fn print_tensor(tensor: *const CTensor) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = if tensor.is_null() {
        writeln!(out, "Error: Null tensor pointer").map_err(TlibError::from)
    } else {
        shape_of(tensor).and_then(|shape| {
            write_rendering(&mut out, &shape, data_of(tensor), 2, None).map_err(TlibError::from)
        })
    };
    if let Err(e) = written {
        fail("print_tensor", e);
    }
}
