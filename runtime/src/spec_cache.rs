//! Kernel spec deduplication cache.
//!
//! Maps (emitter kind, kernel definition) pairs to emitted specs. Uses papaya's
//! lock-free HashMap, so lookups and emissions may run concurrently from any
//! number of threads.

use std::sync::Arc;

use papaya::{Compute, HashMap, Operation};

use crate::emitter::{EmitterKind, emitter_for};
use crate::engine::JitEngine;
use crate::error::Result;
use crate::spec::{KernelDefinition, KernelSpec};

type SpecKey = (EmitterKind, KernelDefinition);

/// Concurrent cache of emitted kernel specs.
pub struct SpecCache {
    engine: Arc<JitEngine>,
    specs: HashMap<SpecKey, Arc<KernelSpec>>,
}

impl SpecCache {
    pub fn new(engine: Arc<JitEngine>) -> Self {
        Self { engine, specs: HashMap::new() }
    }

    /// Get or emit the spec for `definition`.
    ///
    /// If several threads miss on the same key concurrently, each emits, and
    /// all of them receive the spec that was inserted first.
    pub fn get_or_emit(&self, kind: EmitterKind, definition: &KernelDefinition) -> Result<Arc<KernelSpec>> {
        let key = (kind, definition.clone());
        let guard = self.specs.guard();

        // Fast path: spec already cached
        if let Some(cached) = self.specs.get(&key, &guard) {
            return Ok(Arc::clone(cached));
        }

        // Slow path: emit (expensive)
        let spec = Arc::new(emitter_for(kind, Arc::clone(&self.engine))?.emit_kernel_spec(definition)?);
        tracing::debug!(kernel.name = %definition.entry_point, kernel.emitter = %kind, "kernel spec cached");

        match self.specs.compute(
            key,
            |entry| match entry {
                Some((_, existing)) => Operation::Abort(Arc::clone(existing)),
                None => Operation::Insert(Arc::clone(&spec)),
            },
            &guard,
        ) {
            Compute::Inserted(_, spec) => Ok(Arc::clone(spec)),
            Compute::Aborted(spec) => Ok(spec),
            _ => Ok(spec),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Drop every cached spec. Runners already bound keep theirs alive.
    pub fn clear(&self) {
        let guard = self.specs.guard();
        self.specs.clear(&guard);
    }
}

impl std::fmt::Debug for SpecCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecCache").field("engine", &self.engine).field("len", &self.len()).finish()
    }
}
