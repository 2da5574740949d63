//! Allocator bridge
//!
//! Backend memory requests land here and are forwarded to the instance's
//! host. A refused allocation yields a null pointer and sets the instance's
//! allocation-failure flag; the layer that sees the resulting null handle
//! reports [`CmmError::OutOfMemory`](crate::CmmError::OutOfMemory).

use crate::instance::InstanceState;
use std::ptr::{self, NonNull};

/// Allocate `size` bytes from the host, or null.
pub fn allocate(state: &InstanceState, size: usize) -> *mut u8 {
    match state.host().malloc_no_throw(size) {
        Some(p) => {
            tracing::trace!(size, ptr = ?p, "cmm alloc");
            p.as_ptr()
        }
        None => {
            tracing::trace!(size, "cmm alloc refused");
            state.note_alloc_failure();
            ptr::null_mut()
        }
    }
}

/// Return a block to the host. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live block obtained through this bridge for the
/// same host.
pub unsafe fn free(state: &InstanceState, ptr: *mut u8) {
    if let Some(p) = NonNull::new(ptr) {
        tracing::trace!(ptr = ?p, "cmm free");
        unsafe { state.host().free(p) };
    }
}

/// Resize a block.
///
/// A null `ptr` allocates; a zero `size` frees and returns null. Otherwise
/// contents are preserved up to the smaller size, and null means the host
/// refused while the original block stays valid.
///
/// # Safety
///
/// Same as [`free`].
pub unsafe fn reallocate(state: &InstanceState, ptr: *mut u8, size: usize) -> *mut u8 {
    let Some(p) = NonNull::new(ptr) else {
        return allocate(state, size);
    };
    if size == 0 {
        unsafe { free(state, ptr) };
        return ptr::null_mut();
    }
    match unsafe { state.host().realloc_no_throw(p, size) } {
        Some(q) => {
            tracing::trace!(size, from = ?p, to = ?q, "cmm realloc");
            q.as_ptr()
        }
        None => {
            tracing::trace!(size, ptr = ?p, "cmm realloc refused");
            state.note_alloc_failure();
            ptr::null_mut()
        }
    }
}
