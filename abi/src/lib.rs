//! Binary call-frame ABI between compiled kernels and the kernjit runner.
//!
//! Every kernel entry point has the C signature
//!
//! ```c
//! const KernelError* kernel(const KernelCallFrame* frame);
//! ```
//!
//! and returns null on success. Emitters and runners are built independently,
//! so the records below are `#[repr(C)]` and their offsets are pinned by
//! compile-time assertions on 64-bit targets.
//!
//! The runtime never strides arguments for the kernel: each invocation reads its
//! thread index from the frame and computes its own offsets into the argument
//! buffers.

use std::ffi::c_void;
use std::marker::{PhantomData, PhantomPinned};
use std::ptr::NonNull;


/// Version of the record layout below. Bumped on any field change.
pub const ABI_VERSION: u32 = 1;

/// Extents of the thread grid of one kernel call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelThreadDim {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

/// Position of one invocation within the thread grid.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KernelThread {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

/// Argument descriptor: base address and length in bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct KernelArg {
    pub data: *mut c_void,
    pub size: usize,
}

/// Record passed by pointer to every kernel invocation.
///
/// `thread_dims` is the run state shared by all invocations of one call,
/// `thread` is private to the invocation. Both pointers, and `args`, are only
/// valid for the duration of the invocation.
#[repr(C)]
#[derive(Debug)]
pub struct KernelCallFrame {
    pub thread_dims: *const KernelThreadDim,
    pub thread: *const KernelThread,
    pub num_args: usize,
    pub args: *const KernelArg,
}

/// Opaque error handle returned by a failing kernel.
///
/// The runner only compares the handle against null; it never dereferences or
/// frees it.
#[repr(C)]
pub struct KernelError {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl KernelError {
    /// A non-null handle for kernels that have no richer error to report.
    pub fn sentinel() -> *const KernelError {
        NonNull::<KernelError>::dangling().as_ptr()
    }
}

/// Kernel entry point.
pub type KernelFn = unsafe extern "C" fn(frame: *const KernelCallFrame) -> *const KernelError;

#[cfg(target_pointer_width = "64")]
const _: () = {
    use std::mem::{offset_of, size_of};

    assert!(offset_of!(KernelCallFrame, thread_dims) == 0);
    assert!(offset_of!(KernelCallFrame, thread) == 8);
    assert!(offset_of!(KernelCallFrame, num_args) == 16);
    assert!(offset_of!(KernelCallFrame, args) == 24);
    assert!(size_of::<KernelCallFrame>() == 32);

    assert!(offset_of!(KernelArg, data) == 0);
    assert!(offset_of!(KernelArg, size) == 8);
    assert!(size_of::<KernelArg>() == 16);

    assert!(offset_of!(KernelThread, x) == 0);
    assert!(offset_of!(KernelThread, y) == 8);
    assert!(offset_of!(KernelThread, z) == 16);
    assert!(size_of::<KernelThread>() == 24);
    assert!(size_of::<KernelThreadDim>() == 24);
};

impl KernelThreadDim {
    pub const fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Number of invocations, `None` on overflow.
    pub const fn count(&self) -> Option<u64> {
        match self.x.checked_mul(self.y) {
            Some(xy) => xy.checked_mul(self.z),
            None => None,
        }
    }

    /// Whether every extent is at least one.
    pub const fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// Thread position of a linear index, x varying fastest.
    pub const fn delinearize(&self, linear: u64) -> KernelThread {
        let x = linear % self.x;
        let rest = linear / self.x;
        KernelThread { x, y: rest % self.y, z: rest / self.y }
    }

    /// Inverse of [`delinearize`](Self::delinearize).
    pub const fn linearize(&self, thread: KernelThread) -> u64 {
        thread.x + self.x * (thread.y + self.y * thread.z)
    }
}

impl From<(u64, u64, u64)> for KernelThreadDim {
    fn from((x, y, z): (u64, u64, u64)) -> Self {
        Self { x, y, z }
    }
}

impl From<[u64; 3]> for KernelThreadDim {
    fn from([x, y, z]: [u64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for KernelThreadDim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl std::fmt::Display for KernelThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl KernelArg {
    pub fn new(data: *mut u8, size: usize) -> Self {
        Self { data: data.cast(), size }
    }
}

impl KernelCallFrame {
    /// Thread position of this invocation.
    ///
    /// # Safety
    ///
    /// The frame must come from a live invocation.
    pub unsafe fn thread(&self) -> KernelThread {
        unsafe { *self.thread }
    }

    /// Grid extents of the current call.
    ///
    /// # Safety
    ///
    /// The frame must come from a live invocation.
    pub unsafe fn thread_dims(&self) -> KernelThreadDim {
        unsafe { *self.thread_dims }
    }

    /// Argument descriptors of the current call.
    ///
    /// # Safety
    ///
    /// The frame must come from a live invocation.
    pub unsafe fn args(&self) -> &[KernelArg] {
        if self.num_args == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.args, self.num_args) }
    }
}

/// C declarations of the records above, for kernels written in C.
pub const C_HEADER: &str = r#"#include <stddef.h>
#include <stdint.h>

typedef struct KernelThreadDim { uint64_t x, y, z; } KernelThreadDim;
typedef struct KernelThread { uint64_t x, y, z; } KernelThread;
typedef struct KernelArg { void* data; size_t size; } KernelArg;
typedef struct KernelCallFrame {
  const KernelThreadDim* thread_dims;
  const KernelThread* thread;
  size_t num_args;
  const KernelArg* args;
} KernelCallFrame;
typedef struct KernelError KernelError;
"#;
