//! Kernel emitters: source text in, [`KernelSpec`] out.
//!
//! Every emitter checks the thread grid, parses its source, locates the entry
//! point and checks its signature against the call-frame ABI before producing
//! a spec. Failures are compile-time class errors and never leave a partial
//! spec behind.
//!
//! | Kind | Source | Backend |
//! |------|--------|---------|
//! | `cranelift` | Cranelift IR text | `cranelift-jit` |
//! | `llvm` | LLVM IR text | inkwell MCJIT (feature `llvm`) |
//! | `clang` | C source | `clang -shared` + `dlopen` |
//! | `shared-library` | path to a shared object | `dlopen` |
//! | `native` | Rust function ([`KernelSpec::native`]) | none |

pub mod clang;
pub mod cranelift;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod native;
pub mod shared_library;

use std::sync::Arc;

use kernjit_abi::KernelThreadDim;
use snafu::OptionExt;

use crate::engine::JitEngine;
use crate::error::{ConfigSnafu, InvalidThreadDimSnafu, Result};
use crate::spec::{ArgSpec, KernelDefinition, KernelSpec};

pub use clang::ClangEmitter;
pub use cranelift::CraneliftEmitter;
#[cfg(feature = "llvm")]
pub use llvm::LlvmEmitter;
pub use shared_library::SharedLibraryEmitter;

/// Backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum EmitterKind {
    #[default]
    Cranelift,
    Llvm,
    Clang,
    SharedLibrary,
    Native,
}

/// Produces kernel specs from source text.
pub trait KernelEmitter: Send + Sync {
    fn kind(&self) -> EmitterKind;

    fn emit_kernel_spec(&self, definition: &KernelDefinition) -> Result<KernelSpec>;
}

/// Emitter of the given kind backed by `engine`.
pub fn emitter_for(kind: EmitterKind, engine: Arc<JitEngine>) -> Result<Box<dyn KernelEmitter>> {
    match kind {
        EmitterKind::Cranelift => Ok(Box::new(CraneliftEmitter::new(engine))),
        #[cfg(feature = "llvm")]
        EmitterKind::Llvm => Ok(Box::new(LlvmEmitter::new(engine))),
        #[cfg(not(feature = "llvm"))]
        EmitterKind::Llvm => crate::error::BackendUnavailableSnafu {
            kind,
            reason: "kernjit-runtime was built without the `llvm` feature",
        }
        .fail(),
        EmitterKind::Clang => Ok(Box::new(ClangEmitter::new(engine))),
        EmitterKind::SharedLibrary => Ok(Box::new(SharedLibraryEmitter::new())),
        EmitterKind::Native => {
            ConfigSnafu { reason: "native kernels have no source emitter, use KernelSpec::native" }.fail()
        }
    }
}

/// Emitter named by the engine's configuration (`KERNJIT_EMITTER`).
pub fn default_emitter(engine: Arc<JitEngine>) -> Result<Box<dyn KernelEmitter>> {
    let kind = engine.config().emitter;
    emitter_for(kind, engine)
}

/// Emit `entry_point` from `ir_text` with the process-wide engine.
///
/// `args` lists every parameter the kernel reads from its call frame.
#[tracing::instrument(skip_all, fields(kernel.name = entry_point, kernel.emitter = %kind))]
pub fn emit_kernel_spec(
    kind: EmitterKind,
    ir_text: &str,
    entry_point: &str,
    thread_dim: impl Into<KernelThreadDim>,
    args: impl IntoIterator<Item = ArgSpec>,
) -> Result<KernelSpec> {
    let emitter = emitter_for(kind, JitEngine::global()?)?;
    emitter.emit_kernel_spec(&KernelDefinition::new(ir_text, entry_point, thread_dim, args))
}

/// Invocation count of a grid, or an error if it has an empty extent or does not fit `usize`.
pub(crate) fn checked_thread_count(dims: KernelThreadDim) -> Result<usize> {
    dims.count()
        .filter(|_| dims.is_valid())
        .and_then(|count| usize::try_from(count).ok())
        .context(InvalidThreadDimSnafu { dims })
}
