//! Cranelift JIT emitter.
//!
//! Source is Cranelift IR text holding one or more functions. The entry point
//! is `function %<name>(iPTR) -> iPTR`: it receives the call frame and returns
//! the error handle. Functions without an explicit calling convention get the
//! target's C convention. Only the entry point is compiled, so it must be
//! self-contained.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use cranelift_codegen::ir::{Function, UserFuncName};
use cranelift_codegen::isa::{CallConv, TargetIsa};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module, default_libcall_names};
use kernjit_abi::KernelFn;
use snafu::ensure;

use crate::emitter::{EmitterKind, KernelEmitter};
use crate::engine::JitEngine;
use crate::error::{
    BindSnafu, EntryPointNotFoundSnafu, JitCompilationSnafu, ParseIrSnafu, Result, SignatureMismatchSnafu,
    UnsupportedIrSnafu,
};
use crate::spec::{KernelDefinition, KernelSource, KernelSpec};

/// Emits kernels through `cranelift-jit`.
#[derive(Debug, Clone)]
pub struct CraneliftEmitter {
    engine: Arc<JitEngine>,
}

impl CraneliftEmitter {
    pub fn new(engine: Arc<JitEngine>) -> Self {
        Self { engine }
    }
}

impl KernelEmitter for CraneliftEmitter {
    fn kind(&self) -> EmitterKind {
        EmitterKind::Cranelift
    }

    #[tracing::instrument(skip_all, fields(kernel.name = %definition.entry_point))]
    fn emit_kernel_spec(&self, definition: &KernelDefinition) -> Result<KernelSpec> {
        super::checked_thread_count(definition.thread_dim)?;

        let isa = self.engine.isa();
        let functions = cranelift_reader::parse_functions(&definition.source)
            .map_err(|e| ParseIrSnafu { backend: EmitterKind::Cranelift, reason: e.to_string() }.build())?;

        let available: Vec<String> = functions.iter().map(function_name).collect();
        let mut func = functions
            .into_iter()
            .find(|f| function_name(f) == definition.entry_point)
            .ok_or_else(|| EntryPointNotFoundSnafu { name: &definition.entry_point, available }.build())?;

        check_signature(&mut func, &**isa, &definition.entry_point)?;
        ensure!(
            func.dfg.ext_funcs.is_empty(),
            UnsupportedIrSnafu {
                reason: format!("'{}' calls external functions, kernels must be self-contained", definition.entry_point)
            }
        );

        cranelift_codegen::verify_function(&func, &**isa)
            .map_err(|e| ParseIrSnafu { backend: EmitterKind::Cranelift, reason: e.to_string() }.build())?;

        let module = CraneliftModule::compile(isa, &definition.entry_point, func)?;
        tracing::debug!(kernel.name = %definition.entry_point, "Cranelift kernel compiled");

        KernelSpec::new(EmitterKind::Cranelift, definition, Box::new(module))
    }
}

/// Function name without the `%` sigil of testcase names.
fn function_name(func: &Function) -> String {
    match &func.name {
        UserFuncName::Testcase(name) => name.to_string().trim_start_matches('%').to_string(),
        UserFuncName::User(user_ref) => format!("u{}:{}", user_ref.namespace, user_ref.index),
    }
}

fn check_signature(func: &mut Function, isa: &dyn TargetIsa, name: &str) -> Result<()> {
    let ptr = isa.pointer_type();
    let default_conv = isa.default_call_conv();

    // The reader marks functions without an explicit convention as `fast`.
    if func.signature.call_conv == CallConv::Fast {
        func.signature.call_conv = default_conv;
    }

    let sig = &func.signature;
    let params_ok = sig.params.len() == 1 && sig.params[0].value_type == ptr;
    let returns_ok = sig.returns.len() == 1 && sig.returns[0].value_type == ptr;

    ensure!(
        params_ok && returns_ok && sig.call_conv == default_conv,
        SignatureMismatchSnafu {
            name,
            expected: format!("({ptr}) -> {ptr} {default_conv}"),
            actual: sig.to_string(),
        }
    );
    Ok(())
}

/// One JIT module holding one kernel.
struct CraneliftModule {
    module: ManuallyDrop<JITModule>,
    entry: FuncId,
    name: String,
}

// SAFETY: after finalization the module is only read (symbol lookup), and the
// code it maps is immutable until `free_memory` in Drop.
unsafe impl Send for CraneliftModule {}
unsafe impl Sync for CraneliftModule {}

impl CraneliftModule {
    fn compile(isa: &cranelift_codegen::isa::OwnedTargetIsa, name: &str, func: Function) -> Result<Self> {
        let builder = JITBuilder::with_isa(isa.clone(), default_libcall_names());
        let mut module = JITModule::new(builder);

        let jit_err = |what: &str, e: &dyn std::fmt::Display| JitCompilationSnafu { reason: format!("{what}: {e}") }.build();

        let entry = module
            .declare_function(name, Linkage::Export, &func.signature)
            .map_err(|e| jit_err("failed to declare entry point", &e))?;

        let mut ctx = module.make_context();
        ctx.func = func;
        module.define_function(entry, &mut ctx).map_err(|e| jit_err("failed to define entry point", &e))?;
        module.clear_context(&mut ctx);

        module.finalize_definitions().map_err(|e| jit_err("failed to finalize", &e))?;

        Ok(Self { module: ManuallyDrop::new(module), entry, name: name.to_string() })
    }
}

impl KernelSource for CraneliftModule {
    fn resolve(&self, name: &str) -> Result<KernelFn> {
        ensure!(name == self.name, BindSnafu { name, reason: format!("module only exports '{}'", self.name) });
        let ptr = self.module.get_finalized_function(self.entry);
        ensure!(!ptr.is_null(), BindSnafu { name, reason: "finalized function has no address" });

        // SAFETY: the signature was checked to be (iPTR) -> iPTR in the C convention.
        Ok(unsafe { std::mem::transmute::<*const u8, KernelFn>(ptr) })
    }
}

impl Drop for CraneliftModule {
    fn drop(&mut self) {
        // SAFETY: runners hold the spec, and with it this module, while they can call into it.
        unsafe {
            let module = ManuallyDrop::take(&mut self.module);
            module.free_memory();
        }
    }
}
