mod utils;

use z3::{Config, Context};

use pathsynth::executor::error::SymbolicError;
use pathsynth::executor::feasibility::FeasibilityOracle;
use pathsynth::executor::symbolic_execution::SymbolicExecutor;
use pathsynth::executor::symbolic_value::SymbolicValue;
use pathsynth::program::builder::{
    alloc, bin, branch, call, field_addr, int, jump, load, phi, ret, store, var,
};
use pathsynth::program::{
    BinaryOp, FunctionBuilder, Instruction, Location, Operand, Program, ProgramBuilder, Type,
};
use pathsynth::synthesizer::test_case::{synthesize_test_case, synthesize_test_cases};

use utils::{equals, explore, load_sample, quiet_setting};

fn symbolic_loop() -> Program {
    ProgramBuilder::new()
        .function(
            FunctionBuilder::new("count")
                .param("n", Type::int(64))
                .returns(Type::int(64))
                .block(vec![jump(1)])
                .block(vec![
                    phi("i", vec![(0, int(0)), (2, var("next"))]),
                    bin("more", BinaryOp::Lt, var("i"), var("n")),
                    branch(var("more"), 2, 3),
                ])
                .block(vec![bin("next", BinaryOp::Add, var("i"), int(1)), jump(1)])
                .block(vec![ret(var("i"))])
                .build(),
        )
        .build()
}

fn random_threshold() -> Program {
    ProgramBuilder::new()
        .function(
            FunctionBuilder::new("threshold")
                .returns(Type::int(64))
                .block(vec![
                    call(Some("r"), "rand_int", vec![], Some(Type::int(64))),
                    bin("big", BinaryOp::Gt, var("r"), int(10)),
                    branch(var("big"), 1, 2),
                ])
                .block(vec![ret(int(1))])
                .block(vec![ret(int(0))])
                .build(),
        )
        .build()
}

#[test]
fn test_block_visit_budget_bounds_loops() {
    let ctx = Context::new(&Config::new());
    let program = symbolic_loop();
    let mut setting = quiet_setting();
    setting.max_block_visits = 4;

    let report = explore(&ctx, &program, &setting, "count");
    assert_eq!(report.completed_paths.len(), 4);
    assert_eq!(report.dropped_reasons(), vec![("budget_exceeded", 1)]);
    assert!(report.stopped_early.is_none());
}

#[test]
fn test_state_budget_stops_the_run() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let mut setting = quiet_setting();
    setting.max_states = 2;

    let report = explore(&ctx, &program, &setting, "integer_operations");
    assert_eq!(report.completed_paths.len(), 1);
    assert_eq!(report.dropped_paths.len(), 1);
    assert!(report.stopped_early.is_some());
    assert_eq!(report.states_explored, 2);
}

#[test]
fn test_call_depth_budget() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("forever")
                .param("n", Type::int(64))
                .returns(Type::int(64))
                .block(vec![
                    call(Some("r"), "forever", vec![var("n")], Some(Type::int(64))),
                    ret(var("r")),
                ])
                .build(),
        )
        .build();
    let mut setting = quiet_setting();
    setting.max_call_depth = 3;

    let report = explore(&ctx, &program, &setting, "forever");
    assert!(report.completed_paths.is_empty());
    assert_eq!(report.dropped_reasons(), vec![("budget_exceeded", 1)]);
}

#[test]
fn test_unsupported_construct_drops_only_its_state() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("partial")
                .param("a", Type::int(64))
                .returns(Type::int(64))
                .block(vec![bin("neg", BinaryOp::Lt, var("a"), int(0)), branch(var("neg"), 1, 2)])
                .block(vec![Instruction::Unsupported {
                    what: "select".to_string(),
                }])
                .block(vec![ret(var("a"))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "partial");
    assert_eq!(report.completed_paths.len(), 1);
    assert_eq!(report.completed_paths[0].blocks, vec![0, 2]);
    assert_eq!(report.dropped_paths.len(), 1);
    assert_eq!(report.dropped_paths[0].reason.kind(), "unsupported_construct");
    assert_eq!(report.dropped_paths[0].location.block, 1);
}

#[test]
fn test_type_mismatch_halts_the_run() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("broken")
                .param("a", Type::int(64))
                .returns(Type::Bool)
                .block(vec![
                    bin("x", BinaryOp::BoolXor, var("a"), Operand::Bool(true)),
                    ret(var("x")),
                ])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let mut executor = SymbolicExecutor::new(&ctx, &program, &setting);
    let err = match executor.explore("broken") {
        Ok(_) => panic!("a type mismatch must abort exploration"),
        Err(e) => e,
    };
    assert!(err.is_fatal());
    match err {
        SymbolicError::TypeMismatch { location, .. } => assert_eq!(
            location,
            Some(Location {
                function: "broken".to_string(),
                block: 0,
                instr: 0,
            })
        ),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_undeclared_structure_parameter() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("ghost")
                .param("g", Type::structure("Ghost"))
                .block(vec![ret(int(0))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "ghost");
    assert!(report.completed_paths.is_empty());
    assert_eq!(report.dropped_reasons(), vec![("unknown_structure", 1)]);
}

#[test]
fn test_unknown_entry_function() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let setting = quiet_setting();

    let mut executor = SymbolicExecutor::new(&ctx, &program, &setting);
    let err = executor.explore("missing").err().unwrap();
    assert_eq!(err, SymbolicError::UnknownFunction("missing".to_string()));
}

#[test]
fn test_inner_call_returns_to_caller() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("double")
                .param("x", Type::int(64))
                .returns(Type::int(64))
                .block(vec![bin("y", BinaryOp::Mul, var("x"), int(2)), ret(var("y"))])
                .build(),
        )
        .function(
            FunctionBuilder::new("caller")
                .param("a", Type::int(64))
                .returns(Type::int(64))
                .block(vec![
                    call(Some("d"), "double", vec![var("a")], Some(Type::int(64))),
                    ret(var("d")),
                ])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "caller");
    assert_eq!(report.completed_paths.len(), 1);
    let mut path = report.completed_paths[0].clone();
    assert_eq!(path.blocks, vec![0]);

    let six = equals(&ctx, path.result.as_ref().unwrap(), &SymbolicValue::int(6, 64));
    path.constraints.push(six);
    let mut oracle = FeasibilityOracle::new(&ctx, None);
    let case = synthesize_test_case(&mut oracle, &path, setting.max_model_depth)
        .unwrap()
        .unwrap();
    let a = case.argument("a").unwrap().as_int().unwrap();
    assert_eq!(a.wrapping_mul(2), 6);
    assert_eq!(case.expected.as_ref().unwrap().as_int(), Some(6));
}

#[test]
fn test_external_calls_are_mocked() {
    let ctx = Context::new(&Config::new());
    let program = random_threshold();
    let setting = quiet_setting();

    let mut executor = SymbolicExecutor::new(&ctx, &program, &setting);
    let report = executor.explore("threshold").unwrap();
    assert_eq!(report.completed_paths.len(), 2);
    for path in &report.completed_paths {
        assert_eq!(path.external_calls["rand_int"].len(), 1);
    }

    let cases = synthesize_test_cases(&mut executor.oracle, &report, setting.max_model_depth);
    assert_eq!(cases.len(), 2);
    for case in &cases {
        assert_eq!(case.mocked_calls.len(), 1);
        assert_eq!(case.mocked_calls[0].callee, "rand_int");
        let r = case.mocked_calls[0].returns[0].as_int().unwrap();
        let expected = case.expected.as_ref().unwrap().as_int().unwrap();
        assert_eq!(expected, if r > 10 { 1 } else { 0 });
    }
}

#[test]
fn test_external_calls_without_mocking() {
    let ctx = Context::new(&Config::new());
    let program = random_threshold();
    let mut setting = quiet_setting();
    setting.mock_external_calls = false;

    let report = explore(&ctx, &program, &setting, "threshold");
    assert!(report.completed_paths.is_empty());
    assert_eq!(report.dropped_reasons(), vec![("unknown_function", 1)]);
}

#[test]
fn test_nested_struct_does_not_alias_a_separate_instance() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .structure("In", vec![Type::int(64)])
        .structure("Out", vec![Type::structure("In")])
        .function(
            FunctionBuilder::new("isolated")
                .param("a", Type::int(64))
                .returns(Type::int(64))
                .block(vec![
                    alloc("i", Type::structure("In")),
                    field_addr("ix", var("i"), 0),
                    store(var("ix"), int(1)),
                    alloc("o", Type::structure("Out")),
                    field_addr("oi", var("o"), 0),
                    field_addr("oix", var("oi"), 0),
                    store(var("oix"), var("a")),
                    load("x", var("ix")),
                    bin("same", BinaryOp::Eq, var("x"), int(1)),
                    branch(var("same"), 1, 2),
                ])
                .block(vec![ret(int(0))])
                .block(vec![ret(int(1))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "isolated");
    assert_eq!(report.completed_paths.len(), 1);
    assert_eq!(report.completed_paths[0].blocks, vec![0, 1]);
    assert!(report.dropped_paths.is_empty());
}
