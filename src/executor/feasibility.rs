use log::warn;
use z3::ast::Bool;
use z3::{Context, Model, Params, SatResult, Solver};

/// Outcome of one satisfiability check.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Feasibility {
    Feasible,
    Infeasible,
    /// The solver gave up; carries its reason.
    Unknown(String),
}

/// Decides path conditions with a single solver session shared by the
/// whole run. Every query resets the session and asserts the constraints
/// afresh.
pub struct FeasibilityOracle<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
    timeout_ms: Option<u32>,
    pub checks: usize,
}

impl<'ctx> FeasibilityOracle<'ctx> {
    pub fn new(ctx: &'ctx Context, timeout_ms: Option<u32>) -> Self {
        let oracle = FeasibilityOracle {
            ctx,
            solver: Solver::new(ctx),
            timeout_ms,
            checks: 0,
        };
        oracle.configure();
        oracle
    }

    fn configure(&self) {
        if let Some(timeout) = self.timeout_ms {
            let mut params = Params::new(self.ctx);
            params.set_u32("timeout", timeout);
            self.solver.set_params(&params);
        }
    }

    fn prepare(&mut self, constraints: &[Bool<'ctx>]) -> SatResult {
        self.checks += 1;
        self.solver.reset();
        self.configure();
        for constraint in constraints {
            self.solver.assert(constraint);
        }
        self.solver.check()
    }

    pub fn check(&mut self, constraints: &[Bool<'ctx>]) -> Feasibility {
        if constraints.is_empty() {
            return Feasibility::Feasible;
        }
        match self.prepare(constraints) {
            SatResult::Sat => Feasibility::Feasible,
            SatResult::Unsat => Feasibility::Infeasible,
            SatResult::Unknown => Feasibility::Unknown(
                self.solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        }
    }

    /// True only when the constraints are known to be satisfiable; an
    /// undecided query counts as infeasible and is logged.
    pub fn is_feasible(&mut self, constraints: &[Bool<'ctx>]) -> bool {
        match self.check(constraints) {
            Feasibility::Feasible => true,
            Feasibility::Infeasible => false,
            Feasibility::Unknown(reason) => {
                warn!("solver could not decide a path condition: {}", reason);
                false
            }
        }
    }

    /// A model of the constraints, if they are satisfiable.
    pub fn model(&mut self, constraints: &[Bool<'ctx>]) -> Option<Model<'ctx>> {
        match self.prepare(constraints) {
            SatResult::Sat => self.solver.get_model(),
            _ => None,
        }
    }
}
