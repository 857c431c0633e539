//! Cranelift emitter tests: emission, rejection paths, and the AddI32 kernel
//! end to end.

use std::sync::Arc;

use test_case::test_case;

use crate::test::fixtures::*;
use crate::{
    ArgSpec, DType, Dispatch, EmitterKind, Error, KernelDefinition, KernelRunner, KernelThreadDim, Literal, RunnerConfig,
    Shape, emit_kernel_spec, emitter_for,
};

fn emit_err(source: &str, entry_point: &str, dims: impl Into<KernelThreadDim>) -> Error {
    let definition = KernelDefinition::new(source, entry_point, dims, NO_ARGS);
    emitter_for(EmitterKind::Cranelift, engine()).unwrap().emit_kernel_spec(&definition).unwrap_err()
}

#[test]
fn test_add_i32() {
    let spec = emit_kernel_spec(EmitterKind::Cranelift, ADD_I32, "AddI32", (4, 1, 1), add_i32_args(4)).unwrap();
    assert_eq!(spec.name(), "AddI32");
    assert_eq!(spec.kind(), EmitterKind::Cranelift);
    assert_eq!(spec.thread_count(), 4);
    assert_eq!(spec.args().len(), 3);

    let mut runner = KernelRunner::create(Arc::new(spec)).unwrap();

    let mut a = Literal::from_slice(&[1i32, 2, 3, 4]).unwrap();
    let mut b = Literal::from_slice(&[5i32, 6, 7, 8]).unwrap();
    let mut c = Literal::from_slice(&[0i32, 0, 0, 0]).unwrap();
    runner.call(&mut [&mut a, &mut b, &mut c]).unwrap();

    assert_eq!(c.as_slice::<i32>().unwrap(), &[6, 8, 10, 12]);
    assert_eq!(a.as_slice::<i32>().unwrap(), &[1, 2, 3, 4]);
    assert_eq!(b.as_slice::<i32>().unwrap(), &[5, 6, 7, 8]);
}

#[test]
fn test_add_i32_short_argument_list() {
    let spec = emit_kernel_spec(EmitterKind::Cranelift, ADD_I32, "AddI32", (4, 1, 1), add_i32_args(4)).unwrap();
    let mut runner = KernelRunner::create(Arc::new(spec)).unwrap();

    let (mut a, mut b, _) = add_i32_inputs(4);
    let err = runner.call(&mut [&mut a, &mut b]).unwrap_err();
    assert!(matches!(err, Error::ArgumentCount { expected: 3, actual: 2 }), "{err}");

    let (_, _, mut short) = add_i32_inputs(2);
    let err = runner.call(&mut [&mut a, &mut b, &mut short]).unwrap_err();
    assert!(matches!(err, Error::ArgumentSize { index: 2, expected: 16, actual: 8 }), "{err}");
    assert_eq!(short.to_vec::<i32>().unwrap(), vec![0, 0]);
}

#[test_case(Dispatch::Sequential, 1; "sequential single")]
#[test_case(Dispatch::Sequential, 257; "sequential odd")]
#[test_case(Dispatch::Parallel { min_grain: 1 }, 1000; "parallel fine grain")]
#[test_case(Dispatch::Parallel { min_grain: 64 }, 4096; "parallel coarse grain")]
fn test_add_i32_dispatch(dispatch: Dispatch, n: usize) {
    let spec = emit(EmitterKind::Cranelift, ADD_I32, "AddI32", (n as u64, 1, 1), add_i32_args(n));
    let config = RunnerConfig::builder().dispatch(dispatch).build();
    let mut runner = KernelRunner::with_config(spec, config).unwrap();

    let (mut a, mut b, mut c) = add_i32_inputs(n);
    runner.call(&mut [&mut a, &mut b, &mut c]).unwrap();

    let expected = &a.view::<i32>().unwrap() + &b.view::<i32>().unwrap();
    assert_eq!(c.to_array::<i32>().unwrap(), expected);
}

#[test]
fn test_thread_ids_3d() {
    let dims = KernelThreadDim::new(3, 4, 5);
    let n = dims.count().unwrap() as usize;
    let spec = emit(EmitterKind::Cranelift, WRITE_THREAD_ID, "WriteThreadId", dims, [ArgSpec::write(n * 24)]);
    let mut runner = KernelRunner::with_config(spec, RunnerConfig::default()).unwrap();

    let mut out = Literal::new(Shape::array(DType::UInt64, &[n, 3])).unwrap();
    runner.call(&mut [&mut out]).unwrap();

    let rows = out.as_slice::<u64>().unwrap();
    for (linear, row) in rows.chunks_exact(3).enumerate() {
        let thread = dims.delinearize(linear as u64);
        assert_eq!(row, &[thread.x, thread.y, thread.z], "row {linear}");
    }
}

#[test]
fn test_always_fail() {
    let spec = emit(EmitterKind::Cranelift, ALWAYS_FAIL, "AlwaysFail", (4, 1, 1), NO_ARGS);
    let mut runner = KernelRunner::create(spec).unwrap();

    for _ in 0..2 {
        let err = runner.call(&mut []).unwrap_err();
        assert!(err.is_runtime());
        assert!(matches!(err, Error::KernelFailed { handle: 1, .. }), "{err}");
    }
}

#[test]
fn test_missing_entry_point() {
    let err = emit_err(ADD_I32, "Missing", (4, 1, 1));
    assert!(err.is_compilation());
    match err {
        Error::EntryPointNotFound { name, available } => {
            assert_eq!(name, "Missing");
            assert_eq!(available, vec!["AddI32".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_entry_point_among_several() {
    let source = format!("{ADD_I32}\n{ALWAYS_FAIL}");
    let spec = emit(EmitterKind::Cranelift, &source, "AddI32", (2, 1, 1), add_i32_args(2));
    let mut runner = KernelRunner::create(spec).unwrap();

    let (mut a, mut b, mut c) = add_i32_inputs(2);
    runner.call(&mut [&mut a, &mut b, &mut c]).unwrap();
    assert_eq!(c.to_vec::<i32>().unwrap(), vec![4, 6]);
}

#[test]
fn test_signature_mismatch() {
    let err = emit_err(TWO_PARAMS, "TwoParams", (1, 1, 1));
    assert!(matches!(err, Error::SignatureMismatch { .. }), "{err}");
    assert!(err.is_compilation());
}

#[test]
fn test_malformed_ir() {
    let err = emit_err("function %Broken(i64) -> i64 { block0(v0: i64): oops }", "Broken", (1, 1, 1));
    assert!(matches!(err, Error::ParseIr { backend: EmitterKind::Cranelift, .. }), "{err}");
}

#[test_case((0, 1, 1); "empty x")]
#[test_case((4, 0, 1); "empty y")]
#[test_case((1, 1, 0); "empty z")]
#[test_case((u64::MAX, 2, 1); "overflow")]
fn test_invalid_thread_dim(dims: (u64, u64, u64)) {
    let err = emit_err(ADD_I32, "AddI32", dims);
    assert!(matches!(err, Error::InvalidThreadDim { .. }), "{err}");
    assert!(err.is_compilation());
}

#[test]
fn test_repeated_emission_is_independent() {
    let first = emit(EmitterKind::Cranelift, ADD_I32, "AddI32", (3, 1, 1), add_i32_args(3));
    let second = emit(EmitterKind::Cranelift, ADD_I32, "AddI32", (3, 1, 1), add_i32_args(3));
    let mut runner = KernelRunner::create(Arc::clone(&second)).unwrap();
    drop(first);

    let (mut a, mut b, mut c) = add_i32_inputs(3);
    runner.call(&mut [&mut a, &mut b, &mut c]).unwrap();
    assert_eq!(c.to_vec::<i32>().unwrap(), vec![5, 7, 9]);
}
