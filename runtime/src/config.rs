//! Runtime configuration types.
//!
//! Provides typed configuration for the JIT engine and for kernel runners with
//! bon builders. Supports both explicit configuration and environment variable
//! fallbacks.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use bon::bon;
use snafu::ensure;

use crate::emitter::EmitterKind;
use crate::error::{ConfigSnafu, Result};

// ============================================================================
// ENGINE
// ============================================================================

/// Code generator optimization level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    /// Value of Cranelift's `opt_level` setting.
    pub fn cranelift_setting(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Speed => "speed",
            Self::SpeedAndSize => "speed_and_size",
        }
    }

    /// Optimization flag passed to clang.
    pub fn clang_flag(self) -> &'static str {
        match self {
            Self::None => "-O0",
            Self::Speed => "-O2",
            Self::SpeedAndSize => "-Os",
        }
    }

    #[cfg(feature = "llvm")]
    pub fn llvm_level(self) -> inkwell::OptimizationLevel {
        match self {
            Self::None => inkwell::OptimizationLevel::None,
            Self::Speed => inkwell::OptimizationLevel::Aggressive,
            Self::SpeedAndSize => inkwell::OptimizationLevel::Default,
        }
    }
}

/// Configuration of the process-wide [`JitEngine`](crate::JitEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitConfig {
    /// Emitter used when the caller does not name one.
    pub emitter: EmitterKind,
    pub opt_level: OptLevel,
    /// clang executable for the C emitter.
    pub clang: PathBuf,
}

impl Default for JitConfig {
    fn default() -> Self {
        Self { emitter: EmitterKind::default(), opt_level: OptLevel::default(), clang: PathBuf::from("clang") }
    }
}

#[bon]
impl JitConfig {
    /// Create an engine configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default)] emitter: EmitterKind,
        #[builder(default)] opt_level: OptLevel,
        #[builder(default = PathBuf::from("clang"), into)] clang: PathBuf,
    ) -> Self {
        Self { emitter, opt_level, clang }
    }

    /// Create configuration from environment variables, falling back to the
    /// defaults on unparsable values.
    ///
    /// # Environment Variables
    ///
    /// * `KERNJIT_EMITTER` - `cranelift`, `llvm`, `clang` or `shared-library` (default: cranelift)
    /// * `KERNJIT_OPT_LEVEL` - `none`, `speed` or `speed_and_size` (default: speed)
    /// * `KERNJIT_CLANG` - clang executable (default: clang)
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring invalid JIT configuration from environment");
            Self::default()
        })
    }

    /// Like [`from_env`](Self::from_env), but reports unparsable values.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            emitter: parse_var(&lookup, "KERNJIT_EMITTER")?.unwrap_or(defaults.emitter),
            opt_level: parse_var(&lookup, "KERNJIT_OPT_LEVEL")?.unwrap_or(defaults.opt_level),
            clang: lookup("KERNJIT_CLANG").map(PathBuf::from).unwrap_or(defaults.clang),
        })
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// How a runner walks the thread grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// Every index on the calling thread, in linear order.
    Sequential,

    /// Rayon parallel iterator over the linear index range.
    Parallel {
        /// Minimum number of consecutive indices per rayon task.
        min_grain: usize,
    },
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::Parallel { min_grain: 1 }
    }
}

impl Dispatch {
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel { .. })
    }
}

/// Configuration of a [`KernelRunner`](crate::KernelRunner).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    pub dispatch: Dispatch,
    /// Size of a dedicated thread pool. `None` runs on rayon's global pool.
    pub num_threads: Option<usize>,
}

#[bon]
impl RunnerConfig {
    /// Create a runner configuration with builder pattern.
    #[builder]
    pub fn builder(#[builder(default)] dispatch: Dispatch, num_threads: Option<usize>) -> Self {
        Self { dispatch, num_threads }
    }

    /// Create configuration from environment variables, falling back to the
    /// defaults on unparsable values.
    ///
    /// # Environment Variables
    ///
    /// * `KERNJIT_DISPATCH` - `sequential` or `parallel` (default: parallel)
    /// * `KERNJIT_MIN_GRAIN` - Minimum indices per rayon task (default: 1)
    /// * `KERNJIT_NUM_THREADS` - Dedicated pool size (default: rayon's global pool)
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring invalid runner configuration from environment");
            Self::default()
        })
    }

    /// Like [`from_env`](Self::from_env), but reports unparsable values.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let min_grain: usize = parse_var(&lookup, "KERNJIT_MIN_GRAIN")?.unwrap_or(1);
        ensure!(min_grain > 0, ConfigSnafu { reason: "KERNJIT_MIN_GRAIN must be positive" });

        let dispatch = match lookup("KERNJIT_DISPATCH").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("parallel") => Dispatch::Parallel { min_grain },
            Some("sequential") => Dispatch::Sequential,
            Some(other) => {
                return ConfigSnafu { reason: format!("KERNJIT_DISPATCH={other}: expected sequential or parallel") }
                    .fail();
            }
        };

        let num_threads: Option<usize> = parse_var(&lookup, "KERNJIT_NUM_THREADS")?;
        ensure!(num_threads != Some(0), ConfigSnafu { reason: "KERNJIT_NUM_THREADS must be positive" });

        Ok(Self { dispatch, num_threads })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigSnafu { reason: format!("{name}={value}: {e}") }.build()),
        None => Ok(None),
    }
}
