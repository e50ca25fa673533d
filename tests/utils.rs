#![allow(dead_code)]

use z3::ast::Bool;
use z3::Context;

use pathsynth::executor::feasibility::{Feasibility, FeasibilityOracle};
use pathsynth::executor::symbolic_execution::{CompletedPath, ExplorationReport, SymbolicExecutor};
use pathsynth::executor::symbolic_setting::{
    get_default_setting_for_symbolic_execution, SymbolicExecutorSetting,
};
use pathsynth::executor::symbolic_value::SymbolicValue;
use pathsynth::parser_user::load_program;
use pathsynth::program::Program;

pub fn load_sample(name: &str) -> Program {
    load_program(&format!("tests/sample/{}.json", name)).unwrap()
}

pub fn quiet_setting() -> SymbolicExecutorSetting {
    let mut setting = get_default_setting_for_symbolic_execution();
    setting.off_trace = true;
    setting
}

pub fn explore<'ctx>(
    ctx: &'ctx Context,
    program: &Program,
    setting: &SymbolicExecutorSetting,
    function: &str,
) -> ExplorationReport<'ctx> {
    let mut executor = SymbolicExecutor::new(ctx, program, setting);
    executor.explore(function).unwrap()
}

pub fn argument<'a, 'ctx>(path: &'a CompletedPath<'ctx>, name: &str) -> &'a SymbolicValue<'ctx> {
    &path
        .arguments
        .iter()
        .find(|a| a.name == name)
        .unwrap()
        .value
}

/// `value == expected`, as a solver constraint.
pub fn equals<'ctx>(
    ctx: &'ctx Context,
    value: &SymbolicValue<'ctx>,
    expected: &SymbolicValue<'ctx>,
) -> Bool<'ctx> {
    value.eq(ctx, expected).unwrap().to_bool(ctx).unwrap()
}

/// Decides the path condition of `path` strengthened with `extra`.
pub fn check_with<'ctx>(
    ctx: &'ctx Context,
    path: &CompletedPath<'ctx>,
    extra: Vec<Bool<'ctx>>,
) -> Feasibility {
    let mut oracle = FeasibilityOracle::new(ctx, Some(10_000));
    let mut constraints = path.constraints.clone();
    constraints.extend(extra);
    oracle.check(&constraints)
}

pub fn feasible_paths<'a, 'ctx>(
    ctx: &'ctx Context,
    report: &'a ExplorationReport<'ctx>,
    extra: impl Fn(&CompletedPath<'ctx>) -> Vec<Bool<'ctx>>,
) -> Vec<&'a CompletedPath<'ctx>> {
    report
        .completed_paths
        .iter()
        .filter(|path| check_with(ctx, path, extra(path)) == Feasibility::Feasible)
        .collect()
}

/// Constraints fixing integer arguments of `path` to concrete values.
pub fn pin_ints<'ctx>(
    ctx: &'ctx Context,
    path: &CompletedPath<'ctx>,
    values: &[(&str, i64)],
) -> Vec<Bool<'ctx>> {
    values
        .iter()
        .map(|(name, v)| equals(ctx, argument(path, name), &SymbolicValue::int(*v, 64)))
        .collect()
}
