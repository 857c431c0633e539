//! C kernels compiled with clang and loaded with `dlopen`.
//!
//! The source is compiled as a shared object with the call-frame declarations
//! of [`kernjit_abi::C_HEADER`] prepended, so a kernel is written as
//!
//! ```c
//! const KernelError* add(const KernelCallFrame* frame) { ... return NULL; }
//! ```

use std::process::Command;
use std::sync::Arc;

use kernjit_abi::C_HEADER;

use crate::emitter::shared_library::SharedObject;
use crate::emitter::{EmitterKind, KernelEmitter};
use crate::engine::JitEngine;
use crate::error::{BackendUnavailableSnafu, JitCompilationSnafu, MissingSymbolSnafu, ParseIrSnafu, Result};
use crate::spec::{KernelDefinition, KernelSpec};

/// Emits kernels by running the configured clang.
#[derive(Debug, Clone)]
pub struct ClangEmitter {
    engine: Arc<JitEngine>,
}

impl ClangEmitter {
    pub fn new(engine: Arc<JitEngine>) -> Self {
        Self { engine }
    }
}

impl KernelEmitter for ClangEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::Clang
    }

    #[tracing::instrument(skip_all, fields(kernel.name = %definition.entry_point))]
    fn emit_kernel_spec(&self, definition: &KernelDefinition) -> Result<KernelSpec> {
        super::checked_thread_count(definition.thread_dim)?;

        let config = self.engine.config();
        let name = &definition.entry_point;

        let tmp_dir = tempfile::Builder::new()
            .prefix("kernjit-")
            .tempdir()
            .map_err(|e| JitCompilationSnafu { reason: format!("failed to create temp directory: {e}") }.build())?;
        let src_path = tmp_dir.path().join("kernel.c");
        let so_path = tmp_dir.path().join("kernel.so");

        std::fs::write(&src_path, format!("{C_HEADER}\n{}", definition.source))
            .map_err(|e| JitCompilationSnafu { reason: format!("failed to write source file: {e}") }.build())?;

        let output = Command::new(&config.clang)
            .args(["-shared", "-fPIC", config.opt_level.clang_flag(), "-fno-math-errno", "-o"])
            .arg(&so_path)
            .arg(&src_path)
            .output()
            .map_err(|e| {
                BackendUnavailableSnafu {
                    kind: EmitterKind::Clang,
                    reason: format!("failed to run {}: {e}", config.clang.display()),
                }
                .build()
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ParseIrSnafu { backend: EmitterKind::Clang, reason: stderr.into_owned() }.fail();
        }

        let library = SharedObject::open(&so_path, Some(tmp_dir))?;
        // Fail at emission rather than bind when the entry point is missing.
        library
            .symbol(name)
            .map_err(|e| MissingSymbolSnafu { name, library: so_path.as_path(), reason: e.to_string() }.build())?;

        tracing::debug!(kernel.name = %name, "Clang kernel compiled and loaded");
        KernelSpec::new(EmitterKind::Clang, definition, Box::new(library))
    }
}
