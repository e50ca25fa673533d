mod utils;

use z3::{Config, Context};

use pathsynth::executor::feasibility::{Feasibility, FeasibilityOracle};
use pathsynth::executor::symbolic_setting::SearchStrategy;
use pathsynth::executor::symbolic_value::SymbolicValue;
use pathsynth::program::builder::{bin, branch, int, jump, phi, ret, var};
use pathsynth::program::{BinaryOp, FunctionBuilder, ProgramBuilder, Type};
use pathsynth::synthesizer::literal::evaluate;

use utils::{
    argument, check_with, equals, explore, feasible_paths, load_sample, pin_ints, quiet_setting,
};

#[test]
fn test_integer_operations() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "integer_operations");
    assert_eq!(report.completed_paths.len(), 3);
    assert!(report.dropped_paths.is_empty());

    let feasible = feasible_paths(&ctx, &report, |path| pin_ints(&ctx, path, &[("a", 2), ("b", 1)]));
    assert_eq!(feasible.len(), 1);
    let path = feasible[0];
    assert_eq!(path.blocks, vec![0, 1]);

    let result = path.result.as_ref().unwrap();
    let mut constraints = path.constraints.clone();
    constraints.extend(pin_ints(&ctx, path, &[("a", 2), ("b", 1)]));
    let mut oracle = FeasibilityOracle::new(&ctx, None);
    let model = oracle.model(&constraints).unwrap();
    assert_eq!(evaluate(&model, result).unwrap().as_concrete_int(), Some(3));

    let mut extra = pin_ints(&ctx, path, &[("a", 2), ("b", 1)]);
    extra.push(equals(&ctx, result, &SymbolicValue::int(4, 64)));
    assert_eq!(check_with(&ctx, path, extra), Feasibility::Infeasible);
}

#[test]
fn test_constant_loop() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("constant_loop");
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "constant_loop");
    assert_eq!(report.completed_paths.len(), 2);
    assert!(report.dropped_paths.is_empty());

    let feasible = feasible_paths(&ctx, &report, |path| pin_ints(&ctx, path, &[("a", 1)]));
    assert_eq!(feasible.len(), 1);
    let path = feasible[0];
    let result = path.result.as_ref().unwrap();

    let mut extra = pin_ints(&ctx, path, &[("a", 1)]);
    extra.push(equals(&ctx, result, &SymbolicValue::int(10, 64)).not());
    assert_eq!(check_with(&ctx, path, extra), Feasibility::Infeasible);

    // the loop header is entered once per iteration plus the exit check
    assert_eq!(path.blocks.iter().filter(|b| **b == 1).count(), 11);

    for path in &report.completed_paths {
        let result = path.result.as_ref().unwrap();
        let minus_one = equals(&ctx, result, &SymbolicValue::int(-1, 64));
        assert_eq!(check_with(&ctx, path, vec![minus_one]), Feasibility::Infeasible);
    }
}

#[test]
fn test_struct_sum() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("struct_sum");
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "struct_sum");
    assert_eq!(report.completed_paths.len(), 1);
    let path = &report.completed_paths[0];
    let result = path.result.as_ref().unwrap();
    assert_eq!(result.value_type(), Type::float(64));

    for a in [3i64, -7] {
        let expected = SymbolicValue::float(2.0 * a as f64, 64);
        let mut extra = pin_ints(&ctx, path, &[("a", a)]);
        assert_eq!(check_with(&ctx, path, extra.clone()), Feasibility::Feasible);
        extra.push(equals(&ctx, result, &expected).not());
        assert_eq!(check_with(&ctx, path, extra), Feasibility::Infeasible);
    }
}

#[test]
fn test_infeasible_branch_is_pruned() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("nested")
                .param("a", Type::int(64))
                .returns(Type::int(64))
                .block(vec![bin("big", BinaryOp::Gt, var("a"), int(5)), branch(var("big"), 1, 2)])
                .block(vec![bin("small", BinaryOp::Lt, var("a"), int(3)), branch(var("small"), 3, 4)])
                .block(vec![ret(int(0))])
                .block(vec![ret(int(1))])
                .block(vec![ret(int(2))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "nested");
    assert_eq!(report.pruned_branches, 1);
    let mut blocks: Vec<Vec<usize>> = report.completed_paths.iter().map(|p| p.blocks.clone()).collect();
    blocks.sort();
    assert_eq!(blocks, vec![vec![0, 1, 4], vec![0, 2]]);

    // every completed path is satisfiable on its own
    for path in &report.completed_paths {
        assert_eq!(check_with(&ctx, path, Vec::new()), Feasibility::Feasible);
    }
}

#[test]
fn test_dfs_explores_then_branch_first() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "integer_operations");
    let order: Vec<Vec<usize>> = report.completed_paths.iter().map(|p| p.blocks.clone()).collect();
    assert_eq!(order, vec![vec![0, 1], vec![0, 2, 3], vec![0, 2, 4]]);
    assert_eq!(report.coverage.coverage_count(), 3);
}

#[test]
fn test_random_strategy_is_reproducible() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let mut setting = quiet_setting();
    setting.strategy = SearchStrategy::Random;
    setting.seed = 7;

    let first = explore(&ctx, &program, &setting, "integer_operations");
    let second = explore(&ctx, &program, &setting, "integer_operations");
    let blocks = |r: &pathsynth::executor::symbolic_execution::ExplorationReport| {
        r.completed_paths.iter().map(|p| p.blocks.clone()).collect::<Vec<_>>()
    };
    assert_eq!(blocks(&first), blocks(&second));
    assert_eq!(first.completed_paths.len(), 3);
}

#[test]
fn test_nurs_strategy_finds_every_path() {
    let ctx = Context::new(&Config::new());
    let program = load_sample("integer_operations");
    let mut setting = quiet_setting();
    setting.strategy = SearchStrategy::Nurs;

    let report = explore(&ctx, &program, &setting, "integer_operations");
    let mut blocks: Vec<Vec<usize>> = report.completed_paths.iter().map(|p| p.blocks.clone()).collect();
    blocks.sort();
    assert_eq!(blocks, vec![vec![0, 1], vec![0, 2, 3], vec![0, 2, 4]]);
}

#[test]
fn test_phi_takes_most_recent_predecessor() {
    let ctx = Context::new(&Config::new());
    // count up to a symbolic bound n, at most three iterations
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("count")
                .param("n", Type::int(64))
                .returns(Type::int(64))
                .block(vec![bin("ok", BinaryOp::Le, var("n"), int(3)), branch(var("ok"), 1, 4)])
                .block(vec![
                    phi("i", vec![(0, int(0)), (2, var("next"))]),
                    bin("more", BinaryOp::Lt, var("i"), var("n")),
                    branch(var("more"), 2, 3),
                ])
                .block(vec![bin("next", BinaryOp::Add, var("i"), int(1)), jump(1)])
                .block(vec![ret(var("i"))])
                .block(vec![ret(int(-1))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "count");
    assert!(report.dropped_paths.is_empty());
    // n > 3, n <= 0, and n = 1, 2, 3
    assert_eq!(report.completed_paths.len(), 5);

    for n in 1..=3i64 {
        let feasible = feasible_paths(&ctx, &report, |path| pin_ints(&ctx, path, &[("n", n)]));
        assert_eq!(feasible.len(), 1);
        let path = feasible[0];
        let result = path.result.as_ref().unwrap();
        let wrong = equals(&ctx, result, &SymbolicValue::int(n, 64)).not();
        let mut extra = pin_ints(&ctx, path, &[("n", n)]);
        extra.push(wrong);
        assert_eq!(check_with(&ctx, path, extra), Feasibility::Infeasible);
    }

    let path = &report.completed_paths[0];
    assert!(argument(path, "n").value_type() == Type::int(64));
}

#[test]
fn test_parameter_named_result() {
    let ctx = Context::new(&Config::new());
    let program = ProgramBuilder::new()
        .function(
            FunctionBuilder::new("g")
                .param("result", Type::int(64))
                .returns(Type::int(64))
                .block(vec![
                    bin("big", BinaryOp::Gt, var("result"), int(5)),
                    branch(var("big"), 1, 2),
                ])
                .block(vec![ret(int(0))])
                .block(vec![ret(int(1))])
                .build(),
        )
        .build();
    let setting = quiet_setting();

    let report = explore(&ctx, &program, &setting, "g");
    assert_eq!(report.completed_paths.len(), 2);
    assert_eq!(report.pruned_branches, 0);

    let feasible = feasible_paths(&ctx, &report, |path| pin_ints(&ctx, path, &[("result", 7)]));
    assert_eq!(feasible.len(), 1);
    assert_eq!(feasible[0].blocks, vec![0, 1]);
    let returned = feasible[0].result.as_ref().unwrap();
    let mut extra = pin_ints(&ctx, feasible[0], &[("result", 7)]);
    extra.push(equals(&ctx, returned, &SymbolicValue::int(0, 64)).not());
    assert_eq!(check_with(&ctx, feasible[0], extra), Feasibility::Infeasible);
}
