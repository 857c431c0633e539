//! Prebuilt shared objects loaded with `dlopen`.

use std::path::Path;

use kernjit_abi::KernelFn;
use tempfile::TempDir;

use crate::emitter::{EmitterKind, KernelEmitter};
use crate::error::{BindSnafu, JitCompilationSnafu, Result};
use crate::spec::{KernelDefinition, KernelSource, KernelSpec};

/// Loads the shared object at `definition.source`. The entry symbol is looked
/// up when a runner binds the spec.
#[derive(Debug, Clone, Default)]
pub struct SharedLibraryEmitter;

impl SharedLibraryEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl KernelEmitter for SharedLibraryEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::SharedLibrary
    }

    #[tracing::instrument(skip_all, fields(kernel.name = %definition.entry_point, library = %definition.source))]
    fn emit_kernel_spec(&self, definition: &KernelDefinition) -> Result<KernelSpec> {
        super::checked_thread_count(definition.thread_dim)?;
        let library = SharedObject::open(Path::new(&definition.source), None)?;
        tracing::debug!(kernel.name = %definition.entry_point, "shared library loaded");
        KernelSpec::new(EmitterKind::SharedLibrary, definition, Box::new(library))
    }
}

/// A loaded shared object, optionally owning the directory it lives in.
pub(crate) struct SharedObject {
    library: libloading::Library,
    /// Dropped after `library`, so the file outlives the mapping.
    _tmp_dir: Option<TempDir>,
}

impl SharedObject {
    pub(crate) fn open(path: &Path, tmp_dir: Option<TempDir>) -> Result<Self> {
        // SAFETY: loading runs the object's initializers; callers hand us kernel
        // libraries, not arbitrary code.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            JitCompilationSnafu { reason: format!("failed to load shared library {}: {e}", path.display()) }.build()
        })?;
        Ok(Self { library, _tmp_dir: tmp_dir })
    }

    pub(crate) fn symbol(&self, name: &str) -> std::result::Result<KernelFn, libloading::Error> {
        // SAFETY: the symbol is assumed to follow the call-frame ABI; the library
        // stays loaded for as long as the spec holding `self` lives.
        unsafe { self.library.get::<KernelFn>(name.as_bytes()) }.map(|symbol| *symbol)
    }
}

impl KernelSource for SharedObject {
    fn resolve(&self, name: &str) -> Result<KernelFn> {
        self.symbol(name).map_err(|e| BindSnafu { name, reason: e.to_string() }.build())
    }
}
