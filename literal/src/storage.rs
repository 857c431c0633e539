//! Aligned host allocations backing literals.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use snafu::OptionExt;

use crate::error::{AllocationFailedSnafu, Result};

/// Alignment of every literal allocation. Covers any element type and a cache line.
pub const ALIGNMENT: usize = 64;

/// Options for buffer allocation.
#[derive(Debug, Clone, Default)]
pub struct BufferOptions {
    /// Whether to zero-initialize the buffer.
    pub zero_init: bool,
}

/// Uniquely owned, `ALIGNMENT`-aligned heap bytes.
///
/// Zero-length buffers still hold a one-byte allocation so the pointer is
/// always valid and aligned.
pub struct RawBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: RawBuffer owns its allocation exclusively, like Box<[u8]>.
unsafe impl Send for RawBuffer {}
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    /// Allocate `size` bytes.
    ///
    /// Without `zero_init` the contents are uninitialized; reading them before
    /// writing is undefined behavior, so only `unsafe` constructors above this
    /// layer pass `zero_init: false`.
    pub fn alloc(size: usize, options: &BufferOptions) -> Result<Self> {
        let layout = Self::layout(size).context(AllocationFailedSnafu { size })?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { if options.zero_init { alloc::alloc_zeroed(layout) } else { alloc::alloc(layout) } };
        let ptr = NonNull::new(raw).context(AllocationFailedSnafu { size })?;
        Ok(Self { ptr, len: size })
    }

    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size.max(1), ALIGNMENT).ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// # Safety
    ///
    /// The buffer must have been initialized.
    pub unsafe fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// # Safety
    ///
    /// The buffer must have been initialized.
    pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if let Some(layout) = Self::layout(self.len) {
            // SAFETY: allocated in `alloc` with the same layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

impl std::fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBuffer").field("ptr", &self.ptr).field("len", &self.len).finish()
    }
}
