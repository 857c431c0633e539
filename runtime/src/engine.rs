//! Process-wide code generator state.
//!
//! Building the native Cranelift ISA and initializing LLVM's native target are
//! one-time costs. A [`JitEngine`] holds both and is shared by every emitter;
//! each emission still gets its own code module.

use std::sync::{Arc, OnceLock};

use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_codegen::settings::{self, Configurable};

use crate::config::JitConfig;
use crate::error::{JitCompilationSnafu, Result};

static GLOBAL: OnceLock<Arc<JitEngine>> = OnceLock::new();

/// Shared, reentrant code generator state.
pub struct JitEngine {
    config: JitConfig,
    isa: OwnedTargetIsa,
    #[cfg(feature = "llvm")]
    llvm_target: OnceLock<std::result::Result<(), String>>,
}

impl JitEngine {
    pub fn new(config: JitConfig) -> Result<Self> {
        let isa = build_native_isa(&config)?;
        tracing::debug!(
            isa = %isa.triple(),
            opt_level = %config.opt_level,
            emitter = %config.emitter,
            "JIT engine initialized"
        );
        Ok(Self {
            config,
            isa,
            #[cfg(feature = "llvm")]
            llvm_target: OnceLock::new(),
        })
    }

    /// The engine configured from the environment, built on first use.
    pub fn global() -> Result<Arc<Self>> {
        if let Some(engine) = GLOBAL.get() {
            return Ok(Arc::clone(engine));
        }

        // Racing initializers build their own engine; the first one stored wins.
        let engine = Arc::new(Self::new(JitConfig::from_env())?);
        Ok(Arc::clone(GLOBAL.get_or_init(|| engine)))
    }

    pub fn config(&self) -> &JitConfig {
        &self.config
    }

    /// Native target ISA used by the Cranelift emitter.
    pub fn isa(&self) -> &OwnedTargetIsa {
        &self.isa
    }

    /// Initialize LLVM's native target once per engine.
    #[cfg(feature = "llvm")]
    pub(crate) fn ensure_llvm_target(&self) -> Result<()> {
        use inkwell::targets::{InitializationConfig, Target};

        self.llvm_target
            .get_or_init(|| Target::initialize_native(&InitializationConfig::default()))
            .clone()
            .map_err(|reason| crate::Error::BackendUnavailable { kind: crate::EmitterKind::Llvm, reason })
    }
}

impl std::fmt::Debug for JitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitEngine").field("config", &self.config).field("isa", &self.isa.triple()).finish()
    }
}

fn build_native_isa(config: &JitConfig) -> Result<OwnedTargetIsa> {
    let mut flag_builder = settings::builder();
    for (name, value) in
        [("use_colocated_libcalls", "false"), ("is_pic", "false"), ("opt_level", config.opt_level.cranelift_setting())]
    {
        flag_builder
            .set(name, value)
            .map_err(|e| JitCompilationSnafu { reason: format!("failed to set cranelift flag {name}: {e}") }.build())?;
    }

    let isa_builder = cranelift_native::builder()
        .map_err(|e| JitCompilationSnafu { reason: format!("failed to create native ISA builder: {e}") }.build())?;

    isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(|e| JitCompilationSnafu { reason: format!("failed to build native ISA: {e}") }.build())
}
