//! Frame construction and the calls into compiled code.

use std::ptr;

use kernjit_abi::{KernelArg, KernelCallFrame, KernelFn, KernelThreadDim};

use crate::error::{KernelFailedSnafu, Result};

/// Everything one kernel call shares across its invocations.
pub(crate) struct Launch<'a> {
    pub(crate) name: &'a str,
    pub(crate) entry: KernelFn,
    pub(crate) thread_dims: KernelThreadDim,
    pub(crate) args: &'a [KernelArg],
}

// SAFETY: invocations only read the descriptors. Writes through the buffer
// pointers are the kernel's business and must target disjoint regions per index.
unsafe impl Sync for Launch<'_> {}

impl Launch<'_> {
    /// Invoke the entry point for one linear thread index.
    ///
    /// # Safety
    ///
    /// `entry` must follow the call-frame ABI, every descriptor in `args` must
    /// point to live memory of at least `size` bytes, and `linear` must be below
    /// the grid's invocation count.
    pub(crate) unsafe fn invoke(&self, linear: usize) -> Result<()> {
        let thread = self.thread_dims.delinearize(linear as u64);
        let frame = KernelCallFrame {
            thread_dims: &self.thread_dims,
            thread: &thread,
            num_args: self.args.len(),
            args: if self.args.is_empty() { ptr::null() } else { self.args.as_ptr() },
        };

        let status = unsafe { (self.entry)(&frame) };
        if status.is_null() {
            return Ok(());
        }

        KernelFailedSnafu { kernel: self.name, thread, handle: status.addr() }.fail()
    }
}
