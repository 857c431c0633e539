//! LLVM JIT emitter.
//!
//! Source is textual LLVM IR. The entry point must be defined as
//! `define ptr @<name>(ptr %frame)`. Code generation happens when the
//! execution engine first resolves the entry point, i.e. when a runner binds.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum};
use kernjit_abi::KernelFn;
use parking_lot::Mutex;
use snafu::{OptionExt, ensure};

use crate::emitter::{EmitterKind, KernelEmitter};
use crate::engine::JitEngine;
use crate::error::{
    BindSnafu, EntryPointNotFoundSnafu, JitCompilationSnafu, ParseIrSnafu, Result, SignatureMismatchSnafu,
};
use crate::spec::{KernelDefinition, KernelSource, KernelSpec};

/// Emits kernels through an inkwell MCJIT execution engine.
#[derive(Debug, Clone)]
pub struct LlvmEmitter {
    engine: Arc<JitEngine>,
}

impl LlvmEmitter {
    pub fn new(engine: Arc<JitEngine>) -> Self {
        Self { engine }
    }
}

impl KernelEmitter for LlvmEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::Llvm
    }

    #[tracing::instrument(skip_all, fields(kernel.name = %definition.entry_point))]
    fn emit_kernel_spec(&self, definition: &KernelDefinition) -> Result<KernelSpec> {
        super::checked_thread_count(definition.thread_dim)?;
        self.engine.ensure_llvm_target()?;

        let module = LlvmModule::compile(&definition.source, &definition.entry_point, &self.engine)?;
        tracing::debug!(kernel.name = %definition.entry_point, "LLVM module verified");

        KernelSpec::new(EmitterKind::Llvm, definition, Box::new(module))
    }
}

/// LLVM module and execution engine with proper context ownership.
///
/// Uses Box<Context> for stable addressing and ManuallyDrop for correct drop order.
struct LlvmState {
    /// Not directly accessed, but must outlive module and engine.
    #[allow(dead_code)]
    context: Box<Context>,
    /// SAFETY: 'static is a lie; dropped before `context` in Drop.
    module: ManuallyDrop<Module<'static>>,
    /// SAFETY: same as `module`, dropped first.
    execution_engine: ManuallyDrop<ExecutionEngine<'static>>,
}

impl Drop for LlvmState {
    fn drop(&mut self) {
        // SAFETY: reverse dependency order, ExecutionEngine -> Module -> Context.
        unsafe {
            ManuallyDrop::drop(&mut self.execution_engine);
            ManuallyDrop::drop(&mut self.module);
        }
    }
}

struct LlvmModule {
    state: Mutex<LlvmState>,
}

// SAFETY: every access to the LLVM objects goes through the mutex, and the
// context is private to this module.
unsafe impl Send for LlvmModule {}
unsafe impl Sync for LlvmModule {}

impl LlvmModule {
    fn compile(ir: &str, entry_point: &str, engine: &JitEngine) -> Result<Self> {
        let context = Box::new(Context::create());

        // SAFETY: the context is boxed and outlives module and engine, see LlvmState::drop.
        let context_ref: &'static Context = unsafe { &*(context.as_ref() as *const Context) };

        let buffer = MemoryBuffer::create_from_memory_range_copy(ir.as_bytes(), entry_point);
        let module = context_ref
            .create_module_from_ir(buffer)
            .map_err(|e| ParseIrSnafu { backend: EmitterKind::Llvm, reason: e.to_string() }.build())?;

        module
            .verify()
            .map_err(|e| ParseIrSnafu { backend: EmitterKind::Llvm, reason: e.to_string() }.build())?;

        let function = module.get_function(entry_point).filter(|f| f.count_basic_blocks() > 0).with_context(|| {
            EntryPointNotFoundSnafu {
                name: entry_point,
                available: module
                    .get_functions()
                    .filter(|f| f.count_basic_blocks() > 0)
                    .map(|f| f.get_name().to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
            }
        })?;

        let fn_type = function.get_type();
        let params = fn_type.get_param_types();
        let params_ok = params.len() == 1 && matches!(params[0], BasicMetadataTypeEnum::PointerType(_));
        let returns_ok = matches!(fn_type.get_return_type(), Some(BasicTypeEnum::PointerType(_)));
        ensure!(
            params_ok && returns_ok && !fn_type.is_var_arg(),
            SignatureMismatchSnafu {
                name: entry_point,
                expected: "ptr (ptr)",
                actual: fn_type.print_to_string().to_string(),
            }
        );

        let execution_engine = module
            .create_jit_execution_engine(engine.config().opt_level.llvm_level())
            .map_err(|e| JitCompilationSnafu { reason: format!("failed to create execution engine: {e}") }.build())?;

        Ok(Self {
            state: Mutex::new(LlvmState {
                context,
                module: ManuallyDrop::new(module),
                execution_engine: ManuallyDrop::new(execution_engine),
            }),
        })
    }
}

impl KernelSource for LlvmModule {
    fn resolve(&self, name: &str) -> Result<KernelFn> {
        let state = self.state.lock();
        let address = state
            .execution_engine
            .get_function_address(name)
            .map_err(|e| BindSnafu { name, reason: e.to_string() }.build())?;
        ensure!(address != 0, BindSnafu { name, reason: "entry point has no address" });

        // SAFETY: the entry point's signature was checked at emission.
        Ok(unsafe { std::mem::transmute::<usize, KernelFn>(address) })
    }
}
