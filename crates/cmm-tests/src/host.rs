//! Host context that counts allocator traffic and captures warnings

use oxcmm_core::{HostContext, SystemHost};
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// [`SystemHost`] wrapper that records every call made through it
#[derive(Debug, Default)]
pub struct CountingHost {
    allocs: AtomicUsize,
    reallocs: AtomicUsize,
    frees: AtomicUsize,
    refused: AtomicUsize,
    refuse: AtomicBool,
    warnings: Mutex<Vec<String>>,
}

impl CountingHost {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent allocation and reallocation fail.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn reallocs(&self) -> usize {
        self.reallocs.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Requests turned down while refusing
    pub fn refused(&self) -> usize {
        self.refused.load(Ordering::SeqCst)
    }

    /// Blocks handed out and not yet freed
    pub fn live(&self) -> isize {
        self.allocs() as isize - self.frees() as isize
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn refusing(&self) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            self.refused.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}

impl HostContext for CountingHost {
    fn malloc_no_throw(&self, size: usize) -> Option<NonNull<u8>> {
        if self.refusing() {
            return None;
        }
        let ptr = SystemHost.malloc_no_throw(size)?;
        self.allocs.fetch_add(1, Ordering::SeqCst);
        Some(ptr)
    }

    unsafe fn realloc_no_throw(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        if self.refusing() {
            return None;
        }
        let moved = unsafe { SystemHost.realloc_no_throw(ptr, size) }?;
        self.reallocs.fetch_add(1, Ordering::SeqCst);
        Some(moved)
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        unsafe { SystemHost.free(ptr) }
    }

    fn warn(&self, message: &str) {
        tracing::debug!(message, "host warning");
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_owned());
        }
    }
}
