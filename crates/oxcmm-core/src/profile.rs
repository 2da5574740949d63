//! ICC profile handles

use crate::backend::{CmmHandle, LinkBackend};
use std::fmt;

/// ICC bytes plus the backend handle opened from them
///
/// The bytes are borrowed from the caller. A profile without a handle is
/// invalid and cannot be used to build a link. Handles must be released
/// through the instance that opened them (see
/// [`CmmEngine::drop_profile`](crate::CmmEngine::drop_profile)).
pub struct Profile<'a> {
    buffer: &'a [u8],
    handle: Option<CmmHandle>,
    owner: u64,
    num_devcomp: u32,
}

impl<'a> Profile<'a> {
    /// Unopened profile over `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            handle: None,
            owner: 0,
            num_devcomp: 0,
        }
    }

    /// Raw ICC bytes
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Backend handle, if open
    pub fn handle(&self) -> Option<&CmmHandle> {
        self.handle.as_ref()
    }

    /// Id of the instance that opened this profile, 0 if not open
    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// Device channel count; 0 unless open
    pub fn num_devcomp(&self) -> u32 {
        self.num_devcomp
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Store a freshly opened handle. For engine implementations.
    pub fn attach(&mut self, owner: u64, handle: CmmHandle, num_devcomp: u32) {
        debug_assert!(self.handle.is_none(), "profile already open");
        self.handle = Some(handle);
        self.owner = owner;
        self.num_devcomp = num_devcomp;
    }

    /// Take the handle out, leaving the profile invalid. For engine
    /// implementations.
    pub fn detach(&mut self) -> Option<CmmHandle> {
        self.owner = 0;
        self.num_devcomp = 0;
        self.handle.take()
    }
}

/// Close a profile's handle through `backend`, if it has one.
pub fn release_profile<B: LinkBackend + ?Sized>(backend: &B, profile: &mut Profile<'_>) {
    if profile.handle.is_some() && profile.owner != backend.instance_id() {
        tracing::warn!(owner = profile.owner, "not releasing profile opened by another instance");
        return;
    }
    if let Some(handle) = profile.detach() {
        tracing::debug!(?handle, "closing profile");
        backend.close_profile(handle);
    }
}

impl Drop for Profile<'_> {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            tracing::warn!(?handle, "profile dropped while open; backend handle leaked");
        }
    }
}

impl fmt::Debug for Profile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("len", &self.buffer.len())
            .field("handle", &self.handle)
            .field("owner", &self.owner)
            .field("num_devcomp", &self.num_devcomp)
            .finish()
    }
}
