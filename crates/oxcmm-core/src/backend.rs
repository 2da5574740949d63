//! Backend seam
//!
//! Link construction and the pixel executor are written against the traits
//! here rather than against a particular native library, so every engine
//! (and every test double) runs the exact same algorithms.

use crate::format::PixelFormat;
use crate::params::{CmmFlags, RenderingIntent};
use std::fmt;
use std::mem::ManuallyDrop;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};

/// Opaque, non-null backend handle (profile or transform)
#[derive(PartialEq, Eq, Hash)]
pub struct CmmHandle(NonNull<c_void>);

impl CmmHandle {
    /// Wrap a raw backend pointer; null yields `None`.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live handle of the backend it will be
    /// handed to, and ownership of it passes to the returned value.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Raw pointer for backend calls
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl fmt::Debug for CmmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmmHandle({:p})", self.0)
    }
}

/// Primitive backend operations needed to build a link
///
/// Null results are reported as `None`; the caller decides which error
/// they become, consulting [`LinkBackend::take_alloc_failure`] to tell a
/// refused allocation apart from any other failure.
pub trait LinkBackend {
    /// Instance the backend operates under, see [`Instance::id`](crate::Instance::id)
    fn instance_id(&self) -> u64;

    /// Backend pixel-type code of a profile's color space, negative if
    /// unmapped
    fn pixel_space(&self, profile: &CmmHandle) -> i32;

    /// Device channel count of a profile's color space
    fn channels_of(&self, profile: &CmmHandle) -> u32;

    /// Two-profile transform
    fn create_transform(
        &self,
        input: &CmmHandle,
        input_format: PixelFormat,
        output: &CmmHandle,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle>;

    /// Synthesize a device-link profile from a transform
    fn transform_to_device_link(&self, transform: &CmmHandle, version: f64, flags: CmmFlags) -> Option<CmmHandle>;

    /// Chained transform over an ordered profile list
    fn create_multiprofile_transform(
        &self,
        profiles: &[&CmmHandle],
        input_format: PixelFormat,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle>;

    fn delete_transform(&self, transform: CmmHandle);

    fn close_profile(&self, profile: CmmHandle);

    /// Return and clear the "host refused an allocation" flag.
    fn take_alloc_failure(&self) -> bool {
        false
    }
}

/// A compiled transform applied one row at a time
pub trait RowTransform {
    /// Compiled input and output formats
    fn formats(&self) -> (PixelFormat, PixelFormat);

    /// Transform `pixels` pixels from `src` into `dst`.
    ///
    /// Implementations must never touch bytes beyond either slice; the
    /// executor sizes both slices from [`RowTransform::formats`].
    fn transform_row(&self, src: &[u8], dst: &mut [u8], pixels: usize);
}

/// Deletes an intermediate transform on scope exit
pub struct TransformGuard<'b, B: LinkBackend + ?Sized> {
    backend: &'b B,
    handle: CmmHandle,
}

impl<'b, B: LinkBackend + ?Sized> TransformGuard<'b, B> {
    pub fn new(backend: &'b B, handle: CmmHandle) -> Self {
        Self { backend, handle }
    }

    pub fn handle(&self) -> &CmmHandle {
        &self.handle
    }

    /// Keep the transform instead of deleting it.
    pub fn into_inner(self) -> CmmHandle {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the handle is moved out once.
        unsafe { ptr::read(&this.handle) }
    }
}

impl<B: LinkBackend + ?Sized> Drop for TransformGuard<'_, B> {
    fn drop(&mut self) {
        tracing::trace!(handle = ?self.handle, "releasing intermediate transform");
        self.backend.delete_transform(CmmHandle(self.handle.0));
    }
}

/// Closes an intermediate profile on scope exit
pub struct ProfileGuard<'b, B: LinkBackend + ?Sized> {
    backend: &'b B,
    handle: CmmHandle,
}

impl<'b, B: LinkBackend + ?Sized> ProfileGuard<'b, B> {
    pub fn new(backend: &'b B, handle: CmmHandle) -> Self {
        Self { backend, handle }
    }

    pub fn handle(&self) -> &CmmHandle {
        &self.handle
    }

    /// Keep the profile instead of closing it.
    pub fn into_inner(self) -> CmmHandle {
        let this = ManuallyDrop::new(self);
        // SAFETY: as for `TransformGuard::into_inner`.
        unsafe { ptr::read(&this.handle) }
    }
}

impl<B: LinkBackend + ?Sized> Drop for ProfileGuard<'_, B> {
    fn drop(&mut self) {
        tracing::trace!(handle = ?self.handle, "releasing intermediate profile");
        self.backend.close_profile(CmmHandle(self.handle.0));
    }
}
