//! C ABI tests, driving the exported functions the way a foreign caller does.
//! Run with: cargo test -p tlib-ffi

use std::os::raw::c_int;
use std::ptr;

use tensor_lib::*;

/// Owns a `CTensor` for the duration of a test.
struct Owned(*mut CTensor);

impl Owned {
    fn new(shape: &[c_int]) -> Self {
        let t = unsafe { create_tensor(shape.as_ptr(), shape.len() as c_int) };
        assert!(!t.is_null(), "create_tensor failed for {:?}", shape);
        Owned(t)
    }

    fn with_data(shape: &[c_int], values: &[f32]) -> Self {
        let t = Self::new(shape);
        let rc = unsafe { tensor_set_data(t.0, values.as_ptr(), values.len() as c_int) };
        assert_eq!(rc, TLIB_OK);
        t
    }

    fn data(&self) -> &[f32] {
        unsafe { std::slice::from_raw_parts((*self.0).data, (*self.0).size as usize) }
    }

    fn dims(&self) -> &[c_int] {
        unsafe { std::slice::from_raw_parts((*self.0).shape, (*self.0).ndim as usize) }
    }
}

impl Drop for Owned {
    fn drop(&mut self) {
        unsafe { free_tensor(self.0) };
    }
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_ctensor_field_order() {
    assert_eq!(std::mem::offset_of!(CTensor, data), 0);
    let ptr_size = std::mem::size_of::<*mut f32>();
    assert_eq!(std::mem::offset_of!(CTensor, shape), ptr_size);
    assert_eq!(std::mem::offset_of!(CTensor, ndim), 2 * ptr_size);
    assert_eq!(
        std::mem::offset_of!(CTensor, size),
        2 * ptr_size + std::mem::size_of::<c_int>()
    );
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_create_reads_back_shape_and_size() {
    let t = Owned::with_data(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(t.dims(), &[2, 3]);
    unsafe {
        assert_eq!((*t.0).ndim, 2);
        assert_eq!((*t.0).size, 6);
    }
    assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_create_zero_fills() {
    let t = Owned::new(&[4, 4]);
    assert!(t.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_create_rejects_invalid_shapes() {
    unsafe {
        assert!(create_tensor(ptr::null(), 2).is_null());
        let shape = [2, 3];
        assert!(create_tensor(shape.as_ptr(), 0).is_null());
        let zero = [2, 0];
        assert!(create_tensor(zero.as_ptr(), 2).is_null());
        let negative = [-1, 3];
        assert!(create_tensor(negative.as_ptr(), 2).is_null());
        // element count does not fit in c_int
        let huge = [c_int::MAX, 4];
        assert!(create_tensor(huge.as_ptr(), 2).is_null());
    }
}

#[test]
fn test_create_checked_separates_invalid_shape_from_allocation() {
    let mut out: *mut CTensor = ptr::null_mut();
    unsafe {
        let zero = [2, 0];
        let invalid = create_tensor_checked(zero.as_ptr(), 2, &mut out);
        assert_eq!(invalid, TLIB_ERR_INVALID_SHAPE);
        assert!(out.is_null());

        let shape = [2, 3];
        assert_eq!(create_tensor_checked(shape.as_ptr(), 0, &mut out), TLIB_ERR_INVALID_SHAPE);
        assert_eq!(create_tensor_checked(ptr::null(), 2, &mut out), TLIB_ERR_NULL);
        assert_eq!(create_tensor_checked(shape.as_ptr(), 2, ptr::null_mut()), TLIB_ERR_NULL);

        let huge = [c_int::MAX, 4];
        let exhausted = create_tensor_checked(huge.as_ptr(), 2, &mut out);
        assert_eq!(exhausted, TLIB_ERR_ALLOCATION);
        assert!(out.is_null());

        assert_ne!(invalid, exhausted);
    }
}

#[test]
fn test_create_checked_success() {
    let mut out: *mut CTensor = ptr::null_mut();
    let shape = [3, 2];
    let rc = unsafe { create_tensor_checked(shape.as_ptr(), 2, &mut out) };
    assert_eq!(rc, TLIB_OK);
    let t = Owned(out);
    assert_eq!(t.dims(), &[3, 2]);
    assert!(t.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_free_null_is_noop() {
    unsafe { free_tensor(ptr::null_mut()) };
}

// ============================================================================
// Operations
// ============================================================================

#[test]
fn test_add_and_multiply_scenario() {
    let a = Owned::with_data(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
    let b = Owned::with_data(&[2, 2], &[5.0, 6.0, 7.0, 8.0]);
    let c = Owned::new(&[2, 2]);

    assert_eq!(unsafe { tensor_add(a.0, b.0, c.0) }, TLIB_OK);
    assert_eq!(c.data(), &[6.0, 8.0, 10.0, 12.0]);

    assert_eq!(unsafe { tensor_multiply(a.0, b.0, c.0) }, TLIB_OK);
    assert_eq!(c.data(), &[5.0, 12.0, 21.0, 32.0]);

    let mut total = 0.0f32;
    assert_eq!(unsafe { tensor_sum(c.0, &mut total) }, TLIB_OK);
    assert_eq!(total, 70.0);
}

#[test]
fn test_add_into_operand() {
    let a = Owned::with_data(&[3], &[1.0, 2.0, 3.0]);
    let b = Owned::with_data(&[3], &[1.0, 1.0, 1.0]);
    assert_eq!(unsafe { tensor_add(a.0, b.0, a.0) }, TLIB_OK);
    assert_eq!(a.data(), &[2.0, 3.0, 4.0]);
}

#[test]
fn test_shape_mismatch_leaves_result_untouched() {
    let a = Owned::with_data(&[2, 3], &[1.0; 6]);
    let b = Owned::with_data(&[3, 2], &[2.0; 6]);
    let c = Owned::with_data(&[2, 3], &[9.0; 6]);

    assert_eq!(unsafe { tensor_add(a.0, b.0, c.0) }, TLIB_ERR_SHAPE_MISMATCH);
    assert_eq!(c.data(), &[9.0; 6]);
    assert_eq!(unsafe { tensor_multiply(a.0, b.0, c.0) }, TLIB_ERR_SHAPE_MISMATCH);
    assert_eq!(c.data(), &[9.0; 6]);

    // operands match, destination does not
    let d = Owned::with_data(&[6], &[9.0; 6]);
    assert_eq!(unsafe { tensor_add(a.0, a.0, d.0) }, TLIB_ERR_SHAPE_MISMATCH);
    assert_eq!(d.data(), &[9.0; 6]);
}

#[test]
fn test_set_data_count_mismatch() {
    let t = Owned::with_data(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
    let values = [0.0f32; 3];
    let rc = unsafe { tensor_set_data(t.0, values.as_ptr(), 3) };
    assert_eq!(rc, TLIB_ERR_SHAPE_MISMATCH);
    assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_fill_and_random() {
    let t = Owned::new(&[128]);
    assert_eq!(unsafe { tensor_fill(t.0, 0.0) }, TLIB_OK);
    let mut total = 1.0f32;
    assert_eq!(unsafe { tensor_sum(t.0, &mut total) }, TLIB_OK);
    assert_eq!(total, 0.0);

    assert_eq!(unsafe { tensor_random(t.0) }, TLIB_OK);
    assert!(t.data().iter().all(|&v| (0.0..1.0).contains(&v)));
}

#[test]
fn test_null_pointers_report_status() {
    let t = Owned::new(&[2]);
    unsafe {
        assert_eq!(tensor_fill(ptr::null_mut(), 1.0), TLIB_ERR_NULL);
        assert_eq!(tensor_random(ptr::null_mut()), TLIB_ERR_NULL);
        assert_eq!(tensor_add(t.0, ptr::null(), t.0), TLIB_ERR_NULL);
        assert_eq!(tensor_multiply(ptr::null(), t.0, t.0), TLIB_ERR_NULL);
        assert_eq!(tensor_sum(t.0, ptr::null_mut()), TLIB_ERR_NULL);
        assert_eq!(tensor_set_data(t.0, ptr::null(), 2), TLIB_ERR_NULL);
        print_tensor(ptr::null());
    }
}

#[test]
fn test_status_codes_distinguish_exhaustion_from_usage() {
    use tlib_core::TlibError;
    let alloc = status_of(&TlibError::Allocation { requested: 1 });
    let mismatch = status_of(&TlibError::ShapeMismatch {
        expected: vec![1],
        got: vec![2],
    });
    assert_eq!(alloc, TLIB_ERR_ALLOCATION);
    assert_eq!(mismatch, TLIB_ERR_SHAPE_MISMATCH);
    assert_ne!(alloc, mismatch);
}

#[test]
fn test_print_tensor_runs() {
    let t = Owned::with_data(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
    unsafe { print_tensor(t.0) };
}
