//! Kernels written in Rust against the call-frame ABI.

use kernjit_abi::KernelFn;
use snafu::ensure;

use crate::error::{BindSnafu, Result};
use crate::spec::KernelSource;

/// A statically linked entry point. Resolves under any name.
pub(crate) struct NativeSource {
    pub(crate) entry: KernelFn,
}

impl KernelSource for NativeSource {
    fn resolve(&self, name: &str) -> Result<KernelFn> {
        ensure!(!name.is_empty(), BindSnafu { name, reason: "empty kernel name" });
        Ok(self.entry)
    }
}
