//! Thread-grid kernel execution.
//!
//! A [`KernelRunner`] binds one [`KernelSpec`] to its resolved entry point and
//! invokes it once per cell of the spec's thread grid. Each invocation gets a
//! call frame on the dispatching thread's stack; the argument descriptors are
//! built once per call and shared read-only by all invocations.
//!
//! The grid is walked either sequentially or as a rayon parallel iterator over
//! the linear index range. A non-null return from any invocation fails the call
//! and stops further indices from starting.

use std::sync::Arc;

use kernjit_abi::{KernelArg, KernelFn};
use kernjit_literal::Literal;
use rayon::prelude::*;
use snafu::{ResultExt, ensure};

use crate::config::{Dispatch, RunnerConfig};
use crate::error::{ArgumentCountSnafu, ArgumentSizeSnafu, Result, ThreadPoolSnafu};
use crate::ffi::Launch;
use crate::spec::KernelSpec;

/// Executes a bound kernel against caller-supplied buffers.
///
/// `call` takes `&mut self`: a runner is never invoked concurrently with itself.
/// Independent runners over the same `Arc<KernelSpec>` may run on different
/// threads.
pub struct KernelRunner {
    spec: Arc<KernelSpec>,
    entry: KernelFn,
    config: RunnerConfig,
    pool: Option<rayon::ThreadPool>,
    /// Descriptor scratch reused across calls. Empty between calls.
    scratch: Vec<KernelArg>,
}

// SAFETY: `scratch` only holds pointers during a `call`, which borrows both the
// runner and the buffers mutably; between calls it is empty.
unsafe impl Send for KernelRunner {}

impl KernelRunner {
    /// Bind `spec` with configuration from the environment.
    pub fn create(spec: Arc<KernelSpec>) -> Result<Self> {
        Self::with_config(spec, RunnerConfig::from_env())
    }

    #[tracing::instrument(skip_all, fields(kernel.name = %spec.name(), kernel.emitter = %spec.kind()))]
    pub fn with_config(spec: Arc<KernelSpec>, config: RunnerConfig) -> Result<Self> {
        let entry = spec.source().resolve(spec.name())?;

        let pool = match config.num_threads {
            Some(num_threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .thread_name(|i| format!("kernjit-worker-{i}"))
                    .build()
                    .context(ThreadPoolSnafu)?,
            ),
            None => None,
        };

        tracing::debug!(
            kernel.name = %spec.name(),
            kernel.thread_dim = %spec.thread_dim(),
            dispatch = ?config.dispatch,
            num_threads = ?config.num_threads,
            "kernel runner bound"
        );

        let capacity = spec.args().len();
        Ok(Self { spec, entry, config, pool, scratch: Vec::with_capacity(capacity) })
    }

    pub fn spec(&self) -> &Arc<KernelSpec> {
        &self.spec
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the kernel over its whole thread grid.
    ///
    /// Literals are passed to the kernel in order as `(pointer, byte length)`
    /// descriptors and mutated in place. After a failed call their contents are
    /// unspecified.
    #[tracing::instrument(skip_all, fields(kernel.name = %self.spec.name(), kernel.threads = self.spec.thread_count()))]
    pub fn call(&mut self, literals: &mut [&mut Literal]) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.extend(literals.iter_mut().map(|literal| KernelArg::new(literal.as_mut_ptr(), literal.byte_size())));

        // SAFETY: each descriptor covers exactly one live literal, exclusively
        // borrowed for the duration of the call.
        let result = unsafe { self.launch(&scratch) };

        scratch.clear();
        self.scratch = scratch;
        result
    }

    /// Run the kernel over caller-managed memory.
    ///
    /// # Safety
    ///
    /// Every descriptor must point to memory valid for reads and writes of
    /// `size` bytes for the whole call, not aliased by anything else in use.
    pub unsafe fn call_with_args(&mut self, args: &[KernelArg]) -> Result<()> {
        unsafe { self.launch(args) }
    }

    fn check_args(&self, args: &[KernelArg]) -> Result<()> {
        let declared = self.spec.args();
        ensure!(declared.len() == args.len(), ArgumentCountSnafu { expected: declared.len(), actual: args.len() });
        for (index, (spec, arg)) in declared.iter().zip(args).enumerate() {
            ensure!(
                arg.size >= spec.min_bytes,
                ArgumentSizeSnafu { index, expected: spec.min_bytes, actual: arg.size }
            );
        }
        Ok(())
    }

    /// # Safety
    ///
    /// See [`call_with_args`](Self::call_with_args).
    unsafe fn launch(&self, args: &[KernelArg]) -> Result<()> {
        self.check_args(args)?;

        let launch = Launch { name: self.spec.name(), entry: self.entry, thread_dims: self.spec.thread_dim(), args };
        let count = self.spec.thread_count();

        match self.config.dispatch {
            // Single invocation fast path - avoid rayon overhead
            _ if count == 1 => unsafe { launch.invoke(0) },
            Dispatch::Sequential => (0..count).try_for_each(|linear| unsafe { launch.invoke(linear) }),
            Dispatch::Parallel { min_grain } => {
                let run = || {
                    (0..count)
                        .into_par_iter()
                        .with_min_len(min_grain.max(1))
                        .try_for_each(|linear| unsafe { launch.invoke(linear) })
                };
                match &self.pool {
                    Some(pool) => pool.install(run),
                    None => run(),
                }
            }
        }
    }
}

impl std::fmt::Debug for KernelRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRunner").field("spec", &self.spec).field("config", &self.config).finish_non_exhaustive()
    }
}
