//! Fault-injecting link backend
//!
//! Wraps a real [`LinkBackend`], records every primitive call and can make
//! one primitive fail, so link construction can be driven down each error
//! path against a live engine.

use oxcmm_core::{CmmFlags, CmmHandle, LinkBackend, LinkStage, PixelFormat, RenderingIntent};
use std::cell::{Cell, RefCell};

/// One primitive call seen by a [`FaultInjector`]
///
/// Handles are recorded by address.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Transform {
        input: usize,
        output: usize,
        intent: RenderingIntent,
        produced: Option<usize>,
    },
    DeviceLink {
        transform: usize,
        version: f64,
        produced: Option<usize>,
    },
    Multi {
        profiles: Vec<usize>,
        intent: RenderingIntent,
        produced: Option<usize>,
    },
    DeleteTransform(usize),
    CloseProfile(usize),
}

pub fn addr(handle: &CmmHandle) -> usize {
    handle.as_ptr() as usize
}

/// Recording wrapper over another backend
pub struct FaultInjector<B> {
    inner: B,
    fail_at: Cell<Option<LinkStage>>,
    calls: RefCell<Vec<BackendCall>>,
}

impl<B: LinkBackend> FaultInjector<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            fail_at: Cell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Fail the primitive behind `stage`: two-profile transforms for
    /// `Direct` and `ProofIntermediate`, device-link synthesis for
    /// `DeviceLink`, the chained transform for `ProofChain`.
    pub fn fail_at(self, stage: LinkStage) -> Self {
        self.fail_at.set(Some(stage));
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Count of handles created minus handles released
    pub fn outstanding(&self) -> isize {
        self.calls.borrow().iter().fold(0, |n, call| match call {
            BackendCall::Transform { produced, .. }
            | BackendCall::DeviceLink { produced, .. }
            | BackendCall::Multi { produced, .. } => n + isize::from(produced.is_some()),
            BackendCall::DeleteTransform(_) | BackendCall::CloseProfile(_) => n - 1,
        })
    }

    fn failing(&self, stages: &[LinkStage]) -> bool {
        self.fail_at.get().is_some_and(|s| stages.contains(&s))
    }

    fn record(&self, call: BackendCall) {
        tracing::trace!(?call, "backend call");
        self.calls.borrow_mut().push(call);
    }
}

impl<B: LinkBackend> LinkBackend for FaultInjector<B> {
    fn instance_id(&self) -> u64 {
        self.inner.instance_id()
    }

    fn pixel_space(&self, profile: &CmmHandle) -> i32 {
        self.inner.pixel_space(profile)
    }

    fn channels_of(&self, profile: &CmmHandle) -> u32 {
        self.inner.channels_of(profile)
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
        let handle = if self.failing(&[LinkStage::Direct, LinkStage::ProofIntermediate]) {
            None
        } else {
            self.inner
                .create_transform(input, input_format, output, output_format, intent, flags)
        };
        self.record(BackendCall::Transform {
            input: addr(input),
            output: addr(output),
            intent,
            produced: handle.as_ref().map(addr),
        });
        handle
    }

    fn transform_to_device_link(&self, transform: &CmmHandle, version: f64, flags: CmmFlags) -> Option<CmmHandle> {
        let handle = if self.failing(&[LinkStage::DeviceLink]) {
            None
        } else {
            self.inner.transform_to_device_link(transform, version, flags)
        };
        self.record(BackendCall::DeviceLink {
            transform: addr(transform),
            version,
            produced: handle.as_ref().map(addr),
        });
        handle
    }

    fn create_multiprofile_transform(
        &self,
        profiles: &[&CmmHandle],
        input_format: PixelFormat,
        output_format: PixelFormat,
        intent: RenderingIntent,
        flags: CmmFlags,
    ) -> Option<CmmHandle> {
        let handle = if self.failing(&[LinkStage::ProofChain]) {
            None
        } else {
            self.inner
                .create_multiprofile_transform(profiles, input_format, output_format, intent, flags)
        };
        self.record(BackendCall::Multi {
            profiles: profiles.iter().map(|h| addr(h)).collect(),
            intent,
            produced: handle.as_ref().map(addr),
        });
        handle
    }

    fn delete_transform(&self, transform: CmmHandle) {
        self.record(BackendCall::DeleteTransform(addr(&transform)));
        self.inner.delete_transform(transform);
    }

    fn close_profile(&self, profile: CmmHandle) {
        self.record(BackendCall::CloseProfile(addr(&profile)));
        self.inner.close_profile(profile);
    }

    fn take_alloc_failure(&self) -> bool {
        self.inner.take_alloc_failure()
    }
}
