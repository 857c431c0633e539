//! JIT kernel emission and thread-grid execution.
//!
//! An emitter turns IR text plus a thread grid into an immutable
//! [`KernelSpec`]; a [`KernelRunner`] binds the spec and invokes the kernel
//! once per grid cell against caller-owned [`Literal`]s, passing each
//! invocation a call frame as defined in [`kernjit_abi`].
//!
//! ```ignore
//! let args = [ArgSpec::read(16), ArgSpec::read(16), ArgSpec::write(16)];
//! let spec = emit_kernel_spec(EmitterKind::Cranelift, ir, "AddI32", (4, 1, 1), args)?;
//! let mut runner = KernelRunner::create(Arc::new(spec))?;
//! runner.call(&mut [&mut a, &mut b, &mut c])?;
//! ```
//!
//! # Backends
//!
//! Cranelift IR is always available. LLVM IR needs the `llvm` feature; C
//! sources need a `clang` on the path (or `KERNJIT_CLANG`).

pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
mod ffi;
pub mod runner;
pub mod spec;
pub mod spec_cache;


pub use config::{Dispatch, JitConfig, OptLevel, RunnerConfig};
pub use emitter::{EmitterKind, KernelEmitter, default_emitter, emit_kernel_spec, emitter_for};
pub use engine::JitEngine;
pub use error::*;
pub use runner::KernelRunner;
pub use spec::{ArgAccess, ArgSpec, KernelDefinition, KernelSource, KernelSpec};
pub use spec_cache::SpecCache;

pub use kernjit_abi::{KernelArg, KernelCallFrame, KernelError, KernelFn, KernelThread, KernelThreadDim};
pub use kernjit_literal::{DType, Literal, Shape};
