//! Recording backend for unit tests

use crate::backend::{CmmHandle, LinkBackend};
use crate::format::PixelFormat;
use crate::params::{CmmFlags, RenderingIntent};
use crate::profile::Profile;
use oxcmm_lcms_sys as sys;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::os::raw::c_void;

pub const MOCK_INSTANCE: u64 = 7;

pub const GRAY: u32 = sys::ColorSpaceSignature::GrayData as u32;
pub const RGB: u32 = sys::ColorSpaceSignature::RgbData as u32;
pub const CMYK: u32 = sys::ColorSpaceSignature::CmykData as u32;
pub const LAB: u32 = sys::ColorSpaceSignature::LabData as u32;
pub const XYZ: u32 = sys::ColorSpaceSignature::XYZData as u32;

fn channels_for(signature: u32) -> u32 {
    match signature {
        GRAY => 1,
        CMYK => 4,
        _ => 3,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTransform {
        input: usize,
        input_format: PixelFormat,
        output: usize,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    },
    DeviceLink {
        transform: usize,
        version: f64,
    },
    Multi {
        profiles: Vec<usize>,
        input_format: PixelFormat,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    },
    DeleteTransform(usize),
    CloseProfile(usize),
}

/// Backend call to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Transform,
    DeviceLink,
    Multi,
}

pub struct MockBackend {
    pub calls: RefCell<Vec<Call>>,
    spaces: RefCell<HashMap<usize, u32>>,
    next: Cell<usize>,
    pub live_transforms: Cell<isize>,
    pub live_profiles: Cell<isize>,
    pub fail: Cell<Option<Fail>>,
    /// Report failures as refused allocations
    pub refuse_on_fail: Cell<bool>,
    refused: Cell<bool>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            spaces: RefCell::new(HashMap::new()),
            next: Cell::new(0x1000),
            live_transforms: Cell::new(0),
            live_profiles: Cell::new(0),
            fail: Cell::new(None),
            refuse_on_fail: Cell::new(false),
            refused: Cell::new(false),
        }
    }

    fn fresh(&self) -> CmmHandle {
        let addr = self.next.get();
        self.next.set(addr + 0x10);
        unsafe { CmmHandle::from_raw(addr as *mut c_void) }.unwrap()
    }

    /// Open `profile` as if its bytes described `signature`.
    pub fn open(&self, profile: &mut Profile<'_>, signature: u32) {
        let handle = self.fresh();
        self.spaces.borrow_mut().insert(handle.as_ptr() as usize, signature);
        self.live_profiles.set(self.live_profiles.get() + 1);
        profile.attach(MOCK_INSTANCE, handle, channels_for(signature));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Leave a refusal behind, as an earlier unrelated call would.
    pub fn preset_refusal(&self) {
        self.refused.set(true);
    }

    fn signature(&self, profile: &CmmHandle) -> u32 {
        self.spaces.borrow().get(&addr(profile)).copied().unwrap_or(0)
    }

    fn failing(&self, at: Fail) -> bool {
        let failing = self.fail.get() == Some(at);
        if failing && self.refuse_on_fail.get() {
            self.refused.set(true);
        }
        failing
    }
}

pub fn addr(handle: &CmmHandle) -> usize {
    handle.as_ptr() as usize
}

impl LinkBackend for MockBackend {
    fn instance_id(&self) -> u64 {
        MOCK_INSTANCE
    }

    fn pixel_space(&self, profile: &CmmHandle) -> i32 {
        let space = match self.signature(profile) {
            GRAY => sys::PT_GRAY,
            RGB => sys::PT_RGB,
            CMYK => sys::PT_CMYK,
            LAB => sys::PT_Lab,
            _ => return -1,
        };
        space.0 as i32
    }

    fn channels_of(&self, profile: &CmmHandle) -> u32 {
        channels_for(self.signature(profile))
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
        self.calls.borrow_mut().push(Call::CreateTransform {
            input: addr(input),
            input_format,
            output: addr(output),
            output_format,
            intent,
            flags,
        });
        if self.failing(Fail::Transform) {
            return None;
        }
        self.live_transforms.set(self.live_transforms.get() + 1);
        Some(self.fresh())
    }

    fn transform_to_device_link(&self, transform: &CmmHandle, version: f64, _flags: CmmFlags) -> Option<CmmHandle> {
        self.calls.borrow_mut().push(Call::DeviceLink {
            transform: addr(transform),
            version,
        });
        if self.failing(Fail::DeviceLink) {
            return None;
        }
        self.live_profiles.set(self.live_profiles.get() + 1);
        Some(self.fresh())
    }

    fn create_multiprofile_transform(
        &self,
        profiles: &[&CmmHandle],
        input_format: PixelFormat,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle> {
        self.calls.borrow_mut().push(Call::Multi {
            profiles: profiles.iter().map(|h| addr(h)).collect(),
            input_format,
            output_format,
            intent,
            flags,
        });
        if self.failing(Fail::Multi) {
            return None;
        }
        self.live_transforms.set(self.live_transforms.get() + 1);
        Some(self.fresh())
    }

    fn delete_transform(&self, transform: CmmHandle) {
        self.calls.borrow_mut().push(Call::DeleteTransform(addr(&transform)));
        self.live_transforms.set(self.live_transforms.get() - 1);
    }

    fn close_profile(&self, profile: CmmHandle) {
        self.calls.borrow_mut().push(Call::CloseProfile(addr(&profile)));
        self.live_profiles.set(self.live_profiles.get() - 1);
    }

    fn take_alloc_failure(&self) -> bool {
        self.refused.replace(false)
    }
}
