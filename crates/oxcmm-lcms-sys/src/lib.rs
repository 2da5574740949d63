//! Little CMS 2 bindings for a CMM engine
//!
//! Functions, handle types, flags and signatures come from `lcms2-sys` and
//! are re-exported unchanged. This crate adds what `lcms2-sys` leaves out:
//! the memory-handler plugin layout and the format-word packing macros.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use std::os::raw::c_void;

pub use lcms2_sys::ffi::*;

pub type _cmsMallocFnPtrType = Option<unsafe extern "C" fn(ContextID: Context, size: u32) -> *mut c_void>;
pub type _cmsFreeFnPtrType = Option<unsafe extern "C" fn(ContextID: Context, Ptr: *mut c_void)>;
pub type _cmsReallocFnPtrType =
    Option<unsafe extern "C" fn(ContextID: Context, Ptr: *mut c_void, NewSize: u32) -> *mut c_void>;
pub type _cmsMallocZeroFnPtrType = Option<unsafe extern "C" fn(ContextID: Context, size: u32) -> *mut c_void>;
pub type _cmsCallocFnPtrType =
    Option<unsafe extern "C" fn(ContextID: Context, num: u32, size: u32) -> *mut c_void>;
pub type _cmsDupFnPtrType =
    Option<unsafe extern "C" fn(ContextID: Context, Org: *const c_void, size: u32) -> *mut c_void>;

// Plugin header shared by every plugin kind
#[repr(C)]
#[derive(Debug)]
pub struct cmsPluginBase {
    pub Magic: u32,
    pub ExpectedVersion: u32,
    pub Type: u32,
    pub Next: *mut cmsPluginBase,
}

/// Memory handler plugin. Unset optional entries fall back to defaults built
/// on `MallocPtr`/`FreePtr`.
#[repr(C)]
pub struct cmsPluginMemHandler {
    pub base: cmsPluginBase,
    pub MallocPtr: _cmsMallocFnPtrType,
    pub FreePtr: _cmsFreeFnPtrType,
    pub ReallocPtr: _cmsReallocFnPtrType,
    pub MallocZeroPtr: _cmsMallocZeroFnPtrType,
    pub CallocPtr: _cmsCallocFnPtrType,
    pub DupPtr: _cmsDupFnPtrType,
}

// The only pointer field is the plugin chain link, which is always null for
// the statically declared handlers.
unsafe impl Sync for cmsPluginMemHandler {}

pub const cmsPluginMagicNumber: u32 = 0x6163_7070; // 'acpp'
pub const cmsPluginMemHandlerSig: u32 = 0x6D65_6D48; // 'memH'

// Format word packing, mirroring the header macros
pub const fn COLORSPACE_SH(s: u32) -> u32 {
    s << 16
}
pub const fn EXTRA_SH(e: u32) -> u32 {
    e << 7
}
pub const fn CHANNELS_SH(c: u32) -> u32 {
    c << 3
}
pub const fn BYTES_SH(b: u32) -> u32 {
    b
}
pub const fn T_COLORSPACE(t: u32) -> u32 {
    (t >> 16) & 31
}
pub const fn T_EXTRA(t: u32) -> u32 {
    (t >> 7) & 7
}
pub const fn T_CHANNELS(t: u32) -> u32 {
    (t >> 3) & 15
}
pub const fn T_BYTES(t: u32) -> u32 {
    t & 7
}

/// Serialize the built-in sRGB profile of a fresh default context to ICC bytes.
///
/// Returns `None` if the library fails to build or serialize the profile.
pub fn srgb_icc_bytes() -> Option<Vec<u8>> {
    unsafe {
        let ctx = cmsCreateContext(std::ptr::null_mut(), std::ptr::null_mut());
        if ctx.is_null() {
            return None;
        }
        let profile = cmsCreate_sRGBProfileTHR(ctx);
        let mut out = None;
        if !profile.is_null() {
            let mut needed: u32 = 0;
            if cmsSaveProfileToMem(profile, std::ptr::null_mut(), &mut needed) != 0 && needed > 0 {
                let mut bytes = vec![0u8; needed as usize];
                if cmsSaveProfileToMem(profile, bytes.as_mut_ptr() as *mut c_void, &mut needed) != 0 {
                    bytes.truncate(needed as usize);
                    out = Some(bytes);
                }
            }
            cmsCloseProfile(profile);
        }
        cmsDeleteContext(ctx);
        out
    }
}
