use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use test_case::test_case;

use crate::{Dispatch, EmitterKind, ErrorClass, JitConfig, JitEngine, OptLevel, RunnerConfig, default_emitter};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_jit_defaults() {
    let config = JitConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, JitConfig::default());
    assert_eq!(config.emitter, EmitterKind::Cranelift);
    assert_eq!(config.opt_level, OptLevel::Speed);
    assert_eq!(config.clang, PathBuf::from("clang"));
}

#[test_case("cranelift", EmitterKind::Cranelift)]
#[test_case("LLVM", EmitterKind::Llvm)]
#[test_case("clang", EmitterKind::Clang)]
#[test_case("shared-library", EmitterKind::SharedLibrary)]
fn test_emitter_from_env(value: &str, expected: EmitterKind) {
    let config = JitConfig::from_lookup(lookup(&[("KERNJIT_EMITTER", value)])).unwrap();
    assert_eq!(config.emitter, expected);
}

#[test]
fn test_jit_overrides() {
    let config = JitConfig::from_lookup(lookup(&[
        ("KERNJIT_OPT_LEVEL", "speed_and_size"),
        ("KERNJIT_CLANG", "/usr/bin/clang-18"),
    ]))
    .unwrap();
    assert_eq!(config.opt_level, OptLevel::SpeedAndSize);
    assert_eq!(config.clang, PathBuf::from("/usr/bin/clang-18"));
}

#[test]
fn test_jit_builder() {
    let config = JitConfig::builder().opt_level(OptLevel::None).clang("clang-19").build();
    assert_eq!(config.emitter, EmitterKind::Cranelift);
    assert_eq!(config.opt_level, OptLevel::None);
    assert_eq!(config.clang, PathBuf::from("clang-19"));
    assert_eq!(config.opt_level.clang_flag(), "-O0");
}

#[test]
fn test_invalid_values() {
    let err = JitConfig::from_lookup(lookup(&[("KERNJIT_OPT_LEVEL", "ludicrous")])).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);

    assert!(RunnerConfig::from_lookup(lookup(&[("KERNJIT_DISPATCH", "sideways")])).is_err());
    assert!(RunnerConfig::from_lookup(lookup(&[("KERNJIT_MIN_GRAIN", "0")])).is_err());
    assert!(RunnerConfig::from_lookup(lookup(&[("KERNJIT_NUM_THREADS", "zero")])).is_err());
    assert!(RunnerConfig::from_lookup(lookup(&[("KERNJIT_NUM_THREADS", "0")])).is_err());
}

#[test]
fn test_runner_defaults() {
    let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, RunnerConfig::default());
    assert_eq!(config.dispatch, Dispatch::Parallel { min_grain: 1 });
    assert_eq!(config.num_threads, None);
}

#[test]
fn test_runner_from_env() {
    let config = RunnerConfig::from_lookup(lookup(&[
        ("KERNJIT_DISPATCH", "parallel"),
        ("KERNJIT_MIN_GRAIN", "32"),
        ("KERNJIT_NUM_THREADS", "4"),
    ]))
    .unwrap();
    assert_eq!(config.dispatch, Dispatch::Parallel { min_grain: 32 });
    assert_eq!(config.num_threads, Some(4));

    let config = RunnerConfig::from_lookup(lookup(&[("KERNJIT_DISPATCH", "Sequential")])).unwrap();
    assert_eq!(config.dispatch, Dispatch::Sequential);
    assert!(!config.dispatch.is_parallel());
}

#[test_case(EmitterKind::Cranelift)]
#[test_case(EmitterKind::Clang)]
#[test_case(EmitterKind::SharedLibrary)]
fn test_default_emitter_follows_config(kind: EmitterKind) {
    let engine = JitEngine::new(JitConfig::builder().emitter(kind).opt_level(OptLevel::None).build()).unwrap();
    assert_eq!(engine.config().opt_level, OptLevel::None);
    assert_eq!(default_emitter(Arc::new(engine)).unwrap().kind(), kind);
}
