//! Host execution context contract
//!
//! The host supplies a no-throw allocator and a warning sink. Every backend
//! allocation and every backend diagnostic of an [`Instance`](crate::Instance)
//! is routed through the host it was created with.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::Arc;

/// Allocator and diagnostic sink of the embedding application
pub trait HostContext {
    /// Allocate `size` bytes, returning `None` instead of failing loudly.
    fn malloc_no_throw(&self, size: usize) -> Option<NonNull<u8>>;

    /// Resize a block, preserving its contents up to the smaller of the old
    /// and new sizes. On `None` the original block is left untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this host's `malloc_no_throw` or
    /// `realloc_no_throw` and must not have been freed.
    unsafe fn realloc_no_throw(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// Same provenance rules as [`HostContext::realloc_no_throw`].
    unsafe fn free(&self, ptr: NonNull<u8>);

    /// Report a non-fatal diagnostic.
    fn warn(&self, message: &str);
}

const HEADER: usize = 16;
const ALIGN: usize = 16;

/// Host backed by the global Rust allocator and `tracing`
///
/// Each block carries a small header recording its size so that
/// reallocation can hand the original layout back to the allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    /// Shared handle suitable for [`CmmEngine::new_instance`](crate::CmmEngine::new_instance)
    pub fn shared() -> Arc<dyn HostContext> {
        Arc::new(SystemHost)
    }
}

fn block_layout(size: usize) -> Option<Layout> {
    let total = size.checked_add(HEADER)?;
    Layout::from_size_align(total, ALIGN).ok()
}

impl HostContext for SystemHost {
    fn malloc_no_throw(&self, size: usize) -> Option<NonNull<u8>> {
        let layout = block_layout(size)?;
        // SAFETY: layout has non-zero size (HEADER > 0).
        let base = NonNull::new(unsafe { alloc::alloc(layout) })?;
        unsafe {
            base.as_ptr().cast::<usize>().write(size);
            Some(NonNull::new_unchecked(base.as_ptr().add(HEADER)))
        }
    }

    unsafe fn realloc_no_throw(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        let new_layout = block_layout(size)?;
        unsafe {
            let base = ptr.as_ptr().sub(HEADER);
            let old_size = base.cast::<usize>().read();
            let old_layout = Layout::from_size_align_unchecked(old_size + HEADER, ALIGN);
            let new_base = NonNull::new(alloc::realloc(base, old_layout, new_layout.size()))?;
            new_base.as_ptr().cast::<usize>().write(size);
            Some(NonNull::new_unchecked(new_base.as_ptr().add(HEADER)))
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>) {
        unsafe {
            let base = ptr.as_ptr().sub(HEADER);
            let size = base.cast::<usize>().read();
            alloc::dealloc(base, Layout::from_size_align_unchecked(size + HEADER, ALIGN));
        }
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
