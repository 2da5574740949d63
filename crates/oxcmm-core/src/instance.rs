//! Engine context
//!
//! One [`Instance`] exists per host execution context. It owns the backend
//! context and a heap-pinned [`InstanceState`] whose address is handed to the
//! backend as callback user data, so allocator and error callbacks find their
//! host without any process-global state.

use crate::host::HostContext;
use crate::{CmmError, Result};
use std::cell::Cell;
use std::fmt;
use std::os::raw::c_void;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// State block reachable from backend callbacks
pub struct InstanceState {
    host: Arc<dyn HostContext>,
    alloc_failed: Cell<bool>,
}

impl InstanceState {
    fn new(host: Arc<dyn HostContext>) -> Self {
        Self {
            host,
            alloc_failed: Cell::new(false),
        }
    }

    /// Host this instance routes allocations and warnings to
    pub fn host(&self) -> &dyn HostContext {
        &*self.host
    }

    /// Record that the host refused an allocation.
    pub fn note_alloc_failure(&self) {
        self.alloc_failed.set(true);
    }

    /// Return and clear the allocation-failure flag.
    pub fn take_alloc_failure(&self) -> bool {
        self.alloc_failed.replace(false)
    }

    /// Recover the state block from callback user data.
    ///
    /// # Safety
    ///
    /// `user_data` must be null or the pointer passed to the `init` closure of
    /// [`Instance::create`], and that instance must still be alive.
    pub unsafe fn from_user_data<'a>(user_data: *mut c_void) -> Option<&'a InstanceState> {
        unsafe { user_data.cast::<InstanceState>().as_ref() }
    }
}

/// Backend context bound to one host
///
/// Not `Send` or `Sync`: an instance carries mutable backend state and a
/// callback keyed to a single host context. Concurrent workers each create
/// their own.
pub struct Instance {
    id: u64,
    engine: &'static str,
    raw: NonNull<c_void>,
    release: unsafe fn(NonNull<c_void>),
    state: Box<InstanceState>,
}

impl Instance {
    /// Create backend state for `host`.
    ///
    /// `init` receives the user-data pointer for backend callbacks and
    /// returns the backend context, or `None` if it could not be allocated.
    ///
    /// # Safety
    ///
    /// `release` must be the backend's teardown for the context returned by
    /// `init`; it runs exactly once, when the instance is dropped.
    pub unsafe fn create(
        engine: &'static str,
        host: Arc<dyn HostContext>,
        init: impl FnOnce(*mut c_void) -> Option<NonNull<c_void>>,
        release: unsafe fn(NonNull<c_void>),
    ) -> Result<Self> {
        let state = Box::new(InstanceState::new(host));
        let user_data = &*state as *const InstanceState as *mut c_void;
        let raw = init(user_data).ok_or(CmmError::Init)?;
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(engine, id, ctx = ?raw, "created cmm instance");
        Ok(Self {
            id,
            engine,
            raw,
            release,
            state,
        })
    }

    /// Process-unique identifier, never zero
    ///
    /// Profiles and links record it so they are only ever released or
    /// applied through the instance that created them.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Fail with [`CmmError::ForeignHandle`] unless `owner` is this instance.
    pub fn expect_owner(&self, owner: u64) -> Result<()> {
        if owner == self.id {
            Ok(())
        } else {
            Err(CmmError::ForeignHandle)
        }
    }

    /// Name of the engine that created this instance
    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// Backend context pointer
    pub fn raw(&self) -> NonNull<c_void> {
        self.raw
    }

    /// Callback state block
    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    /// Host this instance was created for
    pub fn host(&self) -> &dyn HostContext {
        self.state.host()
    }

    /// Fail with [`CmmError::EngineMismatch`] unless created by `engine`.
    pub fn expect_engine(&self, engine: &'static str) -> Result<()> {
        if self.engine == engine {
            Ok(())
        } else {
            Err(CmmError::EngineMismatch {
                expected: engine,
                actual: self.engine,
            })
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        tracing::debug!(engine = self.engine, ctx = ?self.raw, "dropping cmm instance");
        // The state box outlives this call, so teardown-time frees still
        // reach the host.
        unsafe { (self.release)(self.raw) };
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}
