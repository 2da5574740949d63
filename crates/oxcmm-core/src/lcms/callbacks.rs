//! C callbacks installed on every lcms2 context
//!
//! The context user data is the instance's [`InstanceState`]; nothing here
//! touches process-global state. No callback may unwind into C.

use crate::alloc;
use crate::instance::InstanceState;
use oxcmm_lcms_sys as sys;
use std::borrow::Cow;
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

unsafe fn state<'a>(id: sys::Context) -> Option<&'a InstanceState> {
    unsafe { InstanceState::from_user_data(sys::cmsGetContextUserData(id)) }
}

unsafe extern "C" fn lcms_malloc(id: sys::Context, size: u32) -> *mut c_void {
    panic::catch_unwind(AssertUnwindSafe(|| match unsafe { state(id) } {
        Some(state) => alloc::allocate(state, size as usize).cast(),
        None => ptr::null_mut(),
    }))
    .unwrap_or(ptr::null_mut())
}

unsafe extern "C" fn lcms_free(id: sys::Context, ptr: *mut c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if let Some(state) = unsafe { state(id) } {
            unsafe { alloc::free(state, ptr.cast()) };
        }
    }));
}

unsafe extern "C" fn lcms_realloc(id: sys::Context, ptr: *mut c_void, size: u32) -> *mut c_void {
    panic::catch_unwind(AssertUnwindSafe(|| match unsafe { state(id) } {
        Some(state) => unsafe { alloc::reallocate(state, ptr.cast(), size as usize) }.cast(),
        None => ptr::null_mut(),
    }))
    .unwrap_or(ptr::null_mut())
}

/// Forwards backend diagnostics to the host as warnings.
pub(crate) unsafe extern "C" fn lcms_error(id: sys::Context, code: u32, text: *const c_char) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(state) = (unsafe { state(id) }) else {
            return;
        };
        let text = if text.is_null() {
            Cow::Borrowed("")
        } else {
            unsafe { CStr::from_ptr(text) }.to_string_lossy()
        };
        tracing::trace!(code, "lcms diagnostic");
        state.host().warn(&format!("lcms error: {text}"));
    }));
}

/// Memory handler plugin routing every lcms2 allocation to the host
pub(crate) static MEM_HANDLER: sys::cmsPluginMemHandler = sys::cmsPluginMemHandler {
    base: sys::cmsPluginBase {
        Magic: sys::cmsPluginMagicNumber,
        ExpectedVersion: 2000,
        Type: sys::cmsPluginMemHandlerSig,
        Next: ptr::null_mut(),
    },
    MallocPtr: Some(lcms_malloc),
    FreePtr: Some(lcms_free),
    ReallocPtr: Some(lcms_realloc),
    MallocZeroPtr: None,
    CallocPtr: None,
    DupPtr: None,
};
