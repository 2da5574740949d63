//! Little CMS 2 engine
//!
//! Each [`Instance`] owns one lcms2 context created with the allocator
//! bridge as its memory plugin and the instance state as user data. Links
//! are built by the shared [`build_link`] algorithm over [`LcmsBackend`].

mod backend;
mod callbacks;

pub use backend::LcmsBackend;

use crate::backend::CmmHandle;
use crate::engine::CmmEngine;
use crate::host::HostContext;
use crate::instance::Instance;
use crate::link::{Link, build_link, release_link};
use crate::params::{CmmFlags, LinkParams, RenderingParams};
use crate::pixmap::{Pixmap, PixmapMut};
use crate::profile::{Profile, release_profile};
use crate::transform::{ColorSample, transform_color_with, transform_pixmap_with};
use crate::{CmmError, LinkBackend, Result};
use backend::{LcmsRows, profile_error};
use oxcmm_lcms_sys as sys;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// Registry name of the lcms2 engine
pub const ENGINE_NAME: &str = "lcms2";

/// Engine descriptor for lcms2
pub static LCMS_ENGINE: CmmEngine = CmmEngine {
    name: ENGINE_NAME,
    new_instance,
    drop_instance,
    transform_pixmap,
    transform_color,
    new_link,
    drop_link,
    new_profile,
    drop_profile,
    avoid_white_fix_flag: CmmFlags::NO_WHITE_ON_WHITE_FIXUP,
};

unsafe fn delete_context(raw: NonNull<c_void>) {
    unsafe { sys::cmsDeleteContext(raw.as_ptr().cast()) }
}

fn new_instance(host: Arc<dyn HostContext>) -> Result<Instance> {
    let init = |user_data: *mut c_void| {
        // lcms2 only reads the plugin chain.
        let plugin = ptr::from_ref(&callbacks::MEM_HANDLER).cast_mut().cast::<c_void>();
        NonNull::new(unsafe { sys::cmsCreateContext(plugin, user_data) }).map(NonNull::cast)
    };
    // SAFETY: cmsDeleteContext tears down what cmsCreateContext made.
    let instance = unsafe { Instance::create(ENGINE_NAME, host, init, delete_context) }?;
    unsafe { sys::cmsSetLogErrorHandlerTHR(instance.raw().as_ptr().cast(), Some(callbacks::lcms_error)) };
    Ok(instance)
}

fn drop_instance(instance: Option<Instance>) {
    drop(instance);
}

fn new_profile(instance: &Instance, profile: &mut Profile<'_>) -> Result<()> {
    let backend = LcmsBackend::new(instance)?;
    let ctx = backend.context();
    unsafe { sys::cmsSetLogErrorHandlerTHR(ctx, Some(callbacks::lcms_error)) };

    if profile.is_valid() {
        instance.expect_owner(profile.owner())?;
        release_profile(&backend, profile);
    }
    let bytes = profile.buffer();
    let len = u32::try_from(bytes.len()).map_err(|_| CmmError::TooLarge)?;

    backend.take_alloc_failure();
    let raw = unsafe { sys::cmsOpenProfileFromMemTHR(ctx, bytes.as_ptr().cast(), len) };
    // SAFETY: fresh profile handle from this context.
    let Some(handle) = (unsafe { CmmHandle::from_raw(raw.cast()) }) else {
        tracing::debug!(len, "lcms rejected profile");
        return Err(profile_error(instance));
    };
    let num_devcomp = backend.channels_of(&handle);
    tracing::debug!(?handle, num_devcomp, "opened profile");
    profile.attach(instance.id(), handle, num_devcomp);
    Ok(())
}

fn drop_profile(instance: &Instance, profile: &mut Profile<'_>) {
    match LcmsBackend::new(instance) {
        Ok(backend) => release_profile(&backend, profile),
        Err(err) => tracing::warn!(%err, "cannot release profile"),
    }
}

fn new_link(
    instance: &Instance,
    link: &mut Link,
    rendering: &RenderingParams,
    params: &LinkParams,
    src: &Profile<'_>,
    prf: Option<&Profile<'_>>,
    dst: &Profile<'_>,
) -> Result<()> {
    build_link(&LcmsBackend::new(instance)?, link, rendering, params, src, prf, dst)
}

fn drop_link(instance: &Instance, link: &mut Link) {
    match LcmsBackend::new(instance) {
        Ok(backend) => release_link(&backend, link),
        Err(err) => tracing::warn!(%err, "cannot release link"),
    }
}

fn applicable<'l>(instance: &Instance, link: &'l Link) -> Result<&'l CmmHandle> {
    instance.expect_engine(ENGINE_NAME)?;
    let handle = link.handle().ok_or(CmmError::EmptyLink)?;
    instance.expect_owner(link.owner())?;
    Ok(handle)
}

fn transform_pixmap(instance: &Instance, link: &Link, dst: &mut PixmapMut<'_>, src: &Pixmap<'_>) -> Result<()> {
    let handle = applicable(instance, link)?;
    if u32::try_from(src.width()).is_err() {
        return Err(CmmError::TooLarge);
    }
    transform_pixmap_with(&LcmsRows::new(handle), dst, src)
}

fn transform_color(instance: &Instance, link: &Link, dst: &mut ColorSample, src: &ColorSample) -> Result<()> {
    let handle = applicable(instance, link)?;
    transform_color_with(&LcmsRows::new(handle), dst, src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SystemHost;
    use crate::backend::RowTransform;
    use crate::params::RenderingIntent;
    use crate::transform::MAX_COLORS;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        warnings: RefCell<Vec<String>>,
    }

    impl HostContext for Recording {
        fn malloc_no_throw(&self, size: usize) -> Option<NonNull<u8>> {
            SystemHost.malloc_no_throw(size)
        }
        unsafe fn realloc_no_throw(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
            unsafe { SystemHost.realloc_no_throw(ptr, size) }
        }
        unsafe fn free(&self, ptr: NonNull<u8>) {
            unsafe { SystemHost.free(ptr) }
        }
        fn warn(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_owned());
        }
    }

    fn srgb() -> Vec<u8> {
        sys::srgb_icc_bytes().unwrap()
    }

    #[test]
    fn test_instance_lifecycle() {
        let inst = new_instance(SystemHost::shared()).unwrap();
        assert_eq!(inst.engine(), ENGINE_NAME);
        drop_instance(Some(inst));
        drop_instance(None);
    }

    #[test]
    fn test_profile_open_and_close() {
        let inst = new_instance(SystemHost::shared()).unwrap();
        let bytes = srgb();
        let mut profile = Profile::new(&bytes);
        new_profile(&inst, &mut profile).unwrap();
        assert_eq!(profile.num_devcomp(), 3);
        assert_eq!(profile.owner(), inst.id());
        drop_profile(&inst, &mut profile);
        assert!(!profile.is_valid());
        drop_profile(&inst, &mut profile);
    }

    #[test]
    fn test_garbage_profile_warns_through_host() {
        let host = Arc::new(Recording::default());
        let inst = new_instance(host.clone()).unwrap();
        let bytes = [0x42u8; 200];
        let mut profile = Profile::new(&bytes);
        assert_eq!(new_profile(&inst, &mut profile).unwrap_err(), CmmError::InvalidProfile);
        assert_eq!(profile.num_devcomp(), 0);
        assert!(!profile.is_valid());
        let warnings = host.warnings.borrow();
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|w| w.starts_with("lcms error: ")));
    }

    #[test]
    fn test_identity_color() {
        let inst = new_instance(SystemHost::shared()).unwrap();
        let bytes = srgb();
        let mut profile = Profile::new(&bytes);
        new_profile(&inst, &mut profile).unwrap();

        let mut link = Link::new();
        let rend = RenderingParams::new().with_intent(RenderingIntent::RelativeColorimetric);
        new_link(&inst, &mut link, &rend, &LinkParams::new(2), &profile, None, &profile).unwrap();

        let mut src: ColorSample = [0; MAX_COLORS];
        src[..3].copy_from_slice(&[0x1000, 0x8000, 0xF000]);
        let mut dst: ColorSample = [0; MAX_COLORS];
        transform_color(&inst, &link, &mut dst, &src).unwrap();
        for c in 0..3 {
            assert!((src[c] as i32 - dst[c] as i32).abs() < 0x100, "{c}: {} vs {}", src[c], dst[c]);
        }

        drop_link(&inst, &mut link);
        assert_eq!(transform_color(&inst, &link, &mut dst, &src).unwrap_err(), CmmError::EmptyLink);
        drop_profile(&inst, &mut profile);
    }

    #[test]
    fn test_link_from_other_instance_rejected() {
        let a = new_instance(SystemHost::shared()).unwrap();
        let b = new_instance(SystemHost::shared()).unwrap();
        let bytes = srgb();
        let mut profile = Profile::new(&bytes);
        new_profile(&a, &mut profile).unwrap();

        let mut link = Link::new();
        let err = new_link(&b, &mut link, &RenderingParams::new(), &LinkParams::new(1), &profile, None, &profile)
            .unwrap_err();
        assert_eq!(err, CmmError::ForeignHandle);

        new_link(&a, &mut link, &RenderingParams::new(), &LinkParams::new(1), &profile, None, &profile).unwrap();
        let src = [0u8; 3];
        let mut dst = [0u8; 3];
        let s = Pixmap::new(1, 1, 3, 3, false, &src).unwrap();
        let mut d = PixmapMut::new(1, 1, 3, 3, false, &mut dst).unwrap();
        assert_eq!(transform_pixmap(&b, &link, &mut d, &s).unwrap_err(), CmmError::ForeignHandle);
        transform_pixmap(&a, &link, &mut d, &s).unwrap();

        drop_link(&b, &mut link);
        assert!(link.is_built());
        drop_link(&a, &mut link);
        drop_profile(&a, &mut profile);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "destination row holds fewer than 2 pixels")]
    fn test_short_row_caught_in_debug() {
        let inst = new_instance(SystemHost::shared()).unwrap();
        let bytes = srgb();
        let mut profile = Profile::new(&bytes);
        new_profile(&inst, &mut profile).unwrap();
        let mut link = Link::new();
        new_link(&inst, &mut link, &RenderingParams::new(), &LinkParams::new(1), &profile, None, &profile).unwrap();

        let rows = LcmsRows::new(link.handle().unwrap());
        let src = [0u8; 6];
        let mut dst = [0u8; 5];
        rows.transform_row(&src, &mut dst, 2);
    }
}
