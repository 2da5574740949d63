use crate::backend::{CmmHandle, LinkBackend, RowTransform};
use crate::format::PixelFormat;
use crate::instance::Instance;
use crate::params::{CmmFlags, RenderingIntent};
use crate::{CmmError, Result};
use oxcmm_lcms_sys as sys;

use super::ENGINE_NAME;

/// [`LinkBackend`] over the lcms2 context of one instance
pub struct LcmsBackend<'i> {
    instance: &'i Instance,
}

impl<'i> LcmsBackend<'i> {
    /// Fails unless `instance` was created by the lcms2 engine.
    pub fn new(instance: &'i Instance) -> Result<Self> {
        instance.expect_engine(ENGINE_NAME)?;
        Ok(Self { instance })
    }

    pub(crate) fn context(&self) -> sys::Context {
        self.instance.raw().as_ptr().cast()
    }

    fn wrap<T>(ptr: *mut T) -> Option<CmmHandle> {
        // SAFETY: every pointer passed here was just returned by lcms2 for
        // this instance's context.
        unsafe { CmmHandle::from_raw(ptr.cast()) }
    }
}

fn lcms_intent(intent: RenderingIntent) -> sys::Intent {
    match intent {
        RenderingIntent::Perceptual => sys::Intent::Perceptual,
        RenderingIntent::RelativeColorimetric => sys::Intent::RelativeColorimetric,
        RenderingIntent::Saturation => sys::Intent::Saturation,
        RenderingIntent::AbsoluteColorimetric => sys::Intent::AbsoluteColorimetric,
    }
}

impl LinkBackend for LcmsBackend<'_> {
    fn instance_id(&self) -> u64 {
        self.instance.id()
    }

    fn pixel_space(&self, profile: &CmmHandle) -> i32 {
        unsafe { sys::_cmsLCMScolorSpace(sys::cmsGetColorSpace(profile.as_ptr().cast())) }
    }

    fn channels_of(&self, profile: &CmmHandle) -> u32 {
        unsafe { sys::cmsChannelsOf(sys::cmsGetColorSpace(profile.as_ptr().cast())) }
    }

    fn create_transform(
        &self,
        input: &CmmHandle,
        input_format: PixelFormat,
        output: &CmmHandle,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle> {
        Self::wrap(unsafe {
            sys::cmsCreateTransformTHR(
                self.context(),
                input.as_ptr().cast(),
                sys::PixelFormat(input_format.0),
                output.as_ptr().cast(),
                sys::PixelFormat(output_format.0),
                lcms_intent(intent),
                flags.bits(),
            )
        })
    }

    fn transform_to_device_link(&self, transform: &CmmHandle, version: f64, flags: CmmFlags) -> Option<CmmHandle> {
        Self::wrap(unsafe { sys::cmsTransform2DeviceLink(transform.as_ptr().cast(), version, flags.bits()) })
    }

    fn create_multiprofile_transform(
        &self,
        profiles: &[&CmmHandle],
        input_format: PixelFormat,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle> {
        let mut raw: Vec<sys::HPROFILE> = profiles.iter().map(|h| h.as_ptr().cast()).collect();
        let count = u32::try_from(raw.len()).ok()?;
        Self::wrap(unsafe {
            sys::cmsCreateMultiprofileTransformTHR(
                self.context(),
                raw.as_mut_ptr(),
                count,
                sys::PixelFormat(input_format.0),
                sys::PixelFormat(output_format.0),
                lcms_intent(intent),
                flags.bits(),
            )
        })
    }

    fn delete_transform(&self, transform: CmmHandle) {
        unsafe { sys::cmsDeleteTransform(transform.as_ptr().cast()) }
    }

    fn close_profile(&self, profile: CmmHandle) {
        unsafe { sys::cmsCloseProfile(profile.as_ptr().cast()) };
    }

    fn take_alloc_failure(&self) -> bool {
        self.instance.state().take_alloc_failure()
    }
}

/// Row application of an lcms2 transform
pub(crate) struct LcmsRows<'l> {
    handle: &'l CmmHandle,
    input: PixelFormat,
    output: PixelFormat,
}

impl<'l> LcmsRows<'l> {
    /// Reads the compiled formats back from the transform.
    pub(crate) fn new(handle: &'l CmmHandle) -> Self {
        let (input, output) = unsafe {
            (
                sys::cmsGetTransformInputFormat(handle.as_ptr().cast()),
                sys::cmsGetTransformOutputFormat(handle.as_ptr().cast()),
            )
        };
        Self {
            handle,
            input: PixelFormat(input.0),
            output: PixelFormat(output.0),
        }
    }
}

impl RowTransform for LcmsRows<'_> {
    fn formats(&self) -> (PixelFormat, PixelFormat) {
        (self.input, self.output)
    }

    fn transform_row(&self, src: &[u8], dst: &mut [u8], pixels: usize) {
        // The executor sizes every row; a short slice here is a caller bug.
        debug_assert!(
            pixels.saturating_mul(self.input.bytes_per_pixel()) <= src.len(),
            "source row holds fewer than {pixels} pixels"
        );
        debug_assert!(
            pixels.saturating_mul(self.output.bytes_per_pixel()) <= dst.len(),
            "destination row holds fewer than {pixels} pixels"
        );
        let (Some(fit_src), Some(fit_dst)) = (
            src.len().checked_div(self.input.bytes_per_pixel()),
            dst.len().checked_div(self.output.bytes_per_pixel()),
        ) else {
            return;
        };
        let Ok(count) = u32::try_from(pixels.min(fit_src).min(fit_dst)) else {
            return;
        };
        unsafe {
            sys::cmsDoTransform(self.handle.as_ptr().cast(), src.as_ptr().cast(), dst.as_mut_ptr().cast(), count);
        }
    }
}

/// Map a null profile result to the right error.
pub(crate) fn profile_error(instance: &Instance) -> CmmError {
    if instance.state().take_alloc_failure() {
        CmmError::OutOfMemory
    } else {
        CmmError::InvalidProfile
    }
}
