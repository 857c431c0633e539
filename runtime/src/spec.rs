//! Compiled kernel artifacts.

use std::fmt;

use kernjit_abi::{KernelFn, KernelThreadDim};

use crate::emitter::{EmitterKind, checked_thread_count};
use crate::error::Result;

/// How a kernel uses one of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ArgAccess {
    Read,
    Write,
    ReadWrite,
}

/// Declared argument of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgSpec {
    pub access: ArgAccess,
    /// The runner rejects buffers shorter than this. Zero accepts any length.
    pub min_bytes: usize,
}

impl ArgSpec {
    pub fn read(min_bytes: usize) -> Self {
        Self { access: ArgAccess::Read, min_bytes }
    }

    pub fn write(min_bytes: usize) -> Self {
        Self { access: ArgAccess::Write, min_bytes }
    }

    pub fn read_write(min_bytes: usize) -> Self {
        Self { access: ArgAccess::ReadWrite, min_bytes }
    }
}

/// Input of an emitter: kernel source plus launch metadata.
///
/// `args` is the kernel's full parameter list. Runners refuse calls whose
/// buffer count differs from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, bon::Builder)]
pub struct KernelDefinition {
    /// IR text, C source, or a shared library path, depending on the emitter.
    #[builder(into)]
    pub source: String,
    #[builder(into)]
    pub entry_point: String,
    #[builder(into)]
    pub thread_dim: KernelThreadDim,
    /// Declared arguments, in call order.
    #[builder(with = <_>::from_iter)]
    pub args: Vec<ArgSpec>,
}

impl KernelDefinition {
    pub fn new(
        source: impl Into<String>,
        entry_point: impl Into<String>,
        thread_dim: impl Into<KernelThreadDim>,
        args: impl IntoIterator<Item = ArgSpec>,
    ) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            thread_dim: thread_dim.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// Owner of compiled code that can hand out entry point addresses.
///
/// Implementations keep the code mapped for as long as they live; a resolved
/// [`KernelFn`] must not be called after its source is dropped.
pub trait KernelSource: Send + Sync {
    /// Address of the function `name`. Failures are [`Error::Bind`](crate::Error::Bind).
    fn resolve(&self, name: &str) -> Result<KernelFn>;
}

/// An emitted kernel, ready to be bound by runners.
///
/// Immutable once built. Share it as `Arc<KernelSpec>`; runners keep the
/// compiled code alive through that handle.
pub struct KernelSpec {
    name: String,
    kind: EmitterKind,
    thread_dim: KernelThreadDim,
    thread_count: usize,
    args: Vec<ArgSpec>,
    source: Box<dyn KernelSource>,
}

impl KernelSpec {
    pub(crate) fn new(
        kind: EmitterKind,
        definition: &KernelDefinition,
        source: Box<dyn KernelSource>,
    ) -> Result<Self> {
        let thread_count = checked_thread_count(definition.thread_dim)?;
        Ok(Self {
            name: definition.entry_point.clone(),
            kind,
            thread_dim: definition.thread_dim,
            thread_count,
            args: definition.args.clone(),
            source,
        })
    }

    /// Wrap a Rust function that follows the call-frame ABI.
    pub fn native(
        name: impl Into<String>,
        entry: KernelFn,
        thread_dim: impl Into<KernelThreadDim>,
        args: impl IntoIterator<Item = ArgSpec>,
    ) -> Result<Self> {
        let thread_dim = thread_dim.into();
        let thread_count = checked_thread_count(thread_dim)?;
        Ok(Self {
            name: name.into(),
            kind: EmitterKind::Native,
            thread_dim,
            thread_count,
            args: args.into_iter().collect(),
            source: Box::new(crate::emitter::native::NativeSource { entry }),
        })
    }

    /// Entry point name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EmitterKind {
        self.kind
    }

    pub fn thread_dim(&self) -> KernelThreadDim {
        self.thread_dim
    }

    /// Number of invocations per call.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Declared arguments; a call must pass exactly this many buffers.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn source(&self) -> &dyn KernelSource {
        self.source.as_ref()
    }
}

impl fmt::Debug for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("thread_dim", &self.thread_dim)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
