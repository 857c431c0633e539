//! Error types for kernel emission and execution.

use kernjit_abi::{KernelThread, KernelThreadDim};
use snafu::Snafu;

use crate::emitter::EmitterKind;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse grouping of [`Error`] variants.
///
/// `Compilation` errors come out of emission and never leave a spec behind.
/// Everything else is raised by a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorClass {
    Compilation,
    Bind,
    Argument,
    Runtime,
    Configuration,
}

/// Errors that can occur during kernel emission and execution.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Source text rejected by the backend parser or verifier.
    #[snafu(display("{backend} failed to parse kernel source: {reason}"))]
    ParseIr { backend: EmitterKind, reason: String },

    #[snafu(display("entry point '{name}' not found (available: {})", available.join(", ")))]
    EntryPointNotFound { name: String, available: Vec<String> },

    /// Compiled object lacks the entry symbol.
    #[snafu(display("'{}' does not export entry point '{name}': {reason}", library.display()))]
    MissingSymbol { name: String, library: std::path::PathBuf, reason: String },

    #[snafu(display("entry point '{name}' has signature {actual}, expected {expected}"))]
    SignatureMismatch { name: String, expected: String, actual: String },

    /// Valid IR that uses something the harness cannot link.
    #[snafu(display("unsupported kernel IR: {reason}"))]
    UnsupportedIr { reason: String },

    #[snafu(display("invalid thread grid {dims}: every extent must be positive and the product must fit usize"))]
    InvalidThreadDim { dims: KernelThreadDim },

    /// JIT compilation failed.
    #[snafu(display("JIT compilation failed: {reason}"))]
    JitCompilation { reason: String },

    #[snafu(display("{kind} emitter unavailable: {reason}"))]
    BackendUnavailable { kind: EmitterKind, reason: String },

    /// Entry point could not be resolved to an address.
    #[snafu(display("failed to bind entry point '{name}': {reason}"))]
    Bind { name: String, reason: String },

    #[snafu(display("kernel expects {expected} arguments, got {actual}"))]
    ArgumentCount { expected: usize, actual: usize },

    #[snafu(display("argument {index} holds {actual} bytes, kernel needs at least {expected}"))]
    ArgumentSize { index: usize, expected: usize, actual: usize },

    #[snafu(display("literal error: {source}"))]
    Literal { source: kernjit_literal::Error },

    /// Kernel returned a non-null error handle.
    #[snafu(display("kernel '{kernel}' failed at thread {thread} (error handle {handle:#x})"))]
    KernelFailed { kernel: String, thread: KernelThread, handle: usize },

    #[snafu(display("invalid configuration: {reason}"))]
    Config { reason: String },

    #[snafu(display("failed to build thread pool: {source}"))]
    ThreadPool { source: rayon::ThreadPoolBuildError },
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ParseIr { .. }
            | Self::EntryPointNotFound { .. }
            | Self::MissingSymbol { .. }
            | Self::SignatureMismatch { .. }
            | Self::UnsupportedIr { .. }
            | Self::InvalidThreadDim { .. }
            | Self::JitCompilation { .. }
            | Self::BackendUnavailable { .. } => ErrorClass::Compilation,
            Self::Bind { .. } => ErrorClass::Bind,
            Self::ArgumentCount { .. } | Self::ArgumentSize { .. } | Self::Literal { .. } => ErrorClass::Argument,
            Self::KernelFailed { .. } => ErrorClass::Runtime,
            Self::Config { .. } | Self::ThreadPool { .. } => ErrorClass::Configuration,
        }
    }

    pub fn is_compilation(&self) -> bool {
        self.class() == ErrorClass::Compilation
    }

    pub fn is_runtime(&self) -> bool {
        self.class() == ErrorClass::Runtime
    }

    pub fn is_argument(&self) -> bool {
        self.class() == ErrorClass::Argument
    }
}

impl From<kernjit_literal::Error> for Error {
    fn from(source: kernjit_literal::Error) -> Self {
        Self::Literal { source }
    }
}
