use std::rc::Rc;
use std::time::{Duration, Instant};

use colored::Colorize;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use z3::ast::Bool;
use z3::Context;

use crate::executor::coverage::CoverageTracker;
use crate::executor::error::{SymbolicError, SymbolicResult};
use crate::executor::feasibility::{Feasibility, FeasibilityOracle};
use crate::executor::priority_heap::PriorityHeap;
use crate::executor::symbolic_memory::{Address, Pointer, SymbolicMemory};
use crate::executor::symbolic_setting::{SearchStrategy, SymbolicExecutorSetting};
use crate::executor::symbolic_state::{CallSite, ExternalCallHistory, SymbolicState};
use crate::executor::symbolic_value::{evaluate_binary_op, evaluate_unary_op, SymbolicValue};
use crate::program::{
    ControlFlowInfo, Function, Instruction, Location, Operand, PhiEdge, Program, Type,
};

/// A parameter of the explored function and the value it was bound to.
#[derive(Clone)]
pub struct Argument<'ctx> {
    pub name: String,
    pub ty: Type,
    pub value: SymbolicValue<'ctx>,
}

/// A feasible path that reached the outermost return.
#[derive(Clone)]
pub struct CompletedPath<'ctx> {
    pub function: String,
    pub arguments: Vec<Argument<'ctx>>,
    pub constraints: Vec<Bool<'ctx>>,
    /// The `result` constant asserted equal to the returned value, or the
    /// returned reference itself.
    pub result: Option<SymbolicValue<'ctx>>,
    pub returned: Option<SymbolicValue<'ctx>>,
    pub return_type: Option<Type>,
    /// Memory right after the parameters were bound; input objects are
    /// read back from here when synthesizing literals.
    pub entry_memory: SymbolicMemory<'ctx>,
    pub blocks: Vec<usize>,
    pub external_calls: Rc<ExternalCallHistory<'ctx>>,
}

/// A state abandoned because of a recoverable error.
#[derive(Clone, Debug)]
pub struct DroppedPath {
    pub location: Location,
    pub reason: SymbolicError,
}

/// Everything a run over one function produced.
#[derive(Clone)]
pub struct ExplorationReport<'ctx> {
    pub function: String,
    pub completed_paths: Vec<CompletedPath<'ctx>>,
    pub dropped_paths: Vec<DroppedPath>,
    pub states_explored: usize,
    pub pruned_branches: usize,
    pub solver_checks: usize,
    pub elapsed: Duration,
    /// Set when a run-wide budget stopped exploration early.
    pub stopped_early: Option<String>,
    pub coverage: CoverageTracker,
}

impl<'ctx> ExplorationReport<'ctx> {
    /// Dropped paths grouped by error kind.
    ///
    /// # Returns
    ///
    /// `(kind, count)` pairs sorted by kind, e.g. `("budget_exceeded", 1)`.
    pub fn dropped_reasons(&self) -> Vec<(&'static str, usize)> {
        let mut counts: FxHashMap<&'static str, usize> = FxHashMap::default();
        for dropped in &self.dropped_paths {
            *counts.entry(dropped.reason.kind()).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort();
        counts
    }
}

/// Accumulates the results of the run in progress.
#[derive(Default)]
pub struct SymbolicStore<'ctx> {
    pub completed_paths: Vec<CompletedPath<'ctx>>,
    pub dropped_paths: Vec<DroppedPath>,
    pub states_explored: usize,
    pub pruned_branches: usize,
    pub arguments: Vec<Argument<'ctx>>,
    pub entry_memory: Option<SymbolicMemory<'ctx>>,
}

impl<'ctx> SymbolicStore<'ctx> {
    pub fn clear(&mut self) {
        self.completed_paths.clear();
        self.dropped_paths.clear();
        self.states_explored = 0;
        self.pruned_branches = 0;
        self.arguments.clear();
        self.entry_memory = None;
    }
}

/// What executing a state up to its next scheduling point produced.
enum Flow<'ctx> {
    Continue,
    Yield(Vec<Box<SymbolicState<'ctx>>>),
    Pruned,
}

/// Explores the paths of one function at a time.
///
/// States are drawn from a priority heap and run until they fork, return
/// from the entry function, or fail. Forked children are only scheduled
/// when the feasibility oracle proves their path condition satisfiable.
pub struct SymbolicExecutor<'a, 'ctx> {
    pub ctx: &'ctx Context,
    pub program: &'a Program,
    pub setting: &'a SymbolicExecutorSetting,
    pub symbolic_store: SymbolicStore<'ctx>,
    pub oracle: FeasibilityOracle<'ctx>,
    pub coverage: CoverageTracker,
    cfgs: FxHashMap<String, ControlFlowInfo>,
    rng: StdRng,
    next_seq: u64,
}

fn sorts_before(a: &Box<SymbolicState<'_>>, b: &Box<SymbolicState<'_>>) -> bool {
    (a.priority, a.seq) > (b.priority, b.seq)
}

impl<'a, 'ctx> SymbolicExecutor<'a, 'ctx> {
    /// Creates a new `SymbolicExecutor`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The z3 context every term of the run lives in.
    /// * `program` - The program whose functions are explored.
    /// * `setting` - Search strategy, budgets and solver options.
    ///
    /// # Returns
    ///
    /// An executor with an empty store, a fresh solver session and the
    /// random strategy seeded from `setting.seed`.
    pub fn new(
        ctx: &'ctx Context,
        program: &'a Program,
        setting: &'a SymbolicExecutorSetting,
    ) -> Self {
        SymbolicExecutor {
            ctx,
            program,
            setting,
            symbolic_store: SymbolicStore::default(),
            oracle: FeasibilityOracle::new(ctx, setting.solver_timeout_ms),
            coverage: CoverageTracker::new(),
            cfgs: FxHashMap::default(),
            rng: StdRng::seed_from_u64(setting.seed),
            next_seq: 0,
        }
    }

    /// Resets the store and coverage so the next run starts from scratch.
    /// Cached control-flow facts are kept.
    pub fn clear(&mut self) {
        self.symbolic_store.clear();
        self.coverage.clear();
        self.next_seq = 0;
    }

    /// Control-flow facts of a function, computed once per run.
    ///
    /// # Arguments
    ///
    /// * `function` - The function to analyse; its name is the cache key.
    ///
    /// # Returns
    ///
    /// Successors, predecessors, back edges and NURS depths of `function`.
    pub fn control_flow_info(&mut self, function: &Function) -> &ControlFlowInfo {
        self.cfgs
            .entry(function.name.clone())
            .or_insert_with(|| ControlFlowInfo::new(function))
    }

    /// Explores `function_name` until the worklist drains or a run-wide
    /// budget runs out.
    ///
    /// Recoverable errors drop the offending state and are listed in the
    /// report.
    ///
    /// # Arguments
    ///
    /// * `function_name` - Name of the entry function. Its parameters are
    ///   bound to fresh input objects.
    ///
    /// # Returns
    ///
    /// The completed and dropped paths with run statistics, `UnknownFunction`
    /// when no such function exists, or the located `TypeMismatch` that
    /// aborted the run.
    pub fn explore(&mut self, function_name: &str) -> SymbolicResult<ExplorationReport<'ctx>> {
        self.clear();
        let program = self.program;
        let function = program
            .function(function_name)
            .ok_or_else(|| SymbolicError::UnknownFunction(function_name.to_string()))?;
        let started = Instant::now();
        let solver_checks_before = self.oracle.checks;

        info!(
            "{} {}",
            "🚀 Exploring".green(),
            function_name.bright_yellow()
        );

        let mut heap: PriorityHeap<Box<SymbolicState<'ctx>>, _> = PriorityHeap::new(sorts_before);
        let mut stopped_early = None;

        match self.initial_state(function) {
            Ok(state) => self.schedule(&mut heap, Box::new(state)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => self.drop_state(
                Location {
                    function: function_name.to_string(),
                    block: 0,
                    instr: 0,
                },
                e,
            ),
        }

        while let Some(mut state) = heap.pop() {
            if let Some(reason) = self.run_budget_exhausted(started) {
                warn!("stopping exploration of `{}`: {}", function_name, reason);
                self.drop_state(state.cursor.clone(), SymbolicError::BudgetExceeded(reason.clone()));
                for queued in heap.drain() {
                    self.symbolic_store.dropped_paths.push(DroppedPath {
                        location: queued.cursor.clone(),
                        reason: SymbolicError::BudgetExceeded(reason.clone()),
                    });
                }
                stopped_early = Some(reason);
                break;
            }

            self.symbolic_store.states_explored += 1;
            debug!(
                "{} {} (priority={}, queued={})",
                "⏏️ Pop".cyan(),
                state.cursor,
                state.priority,
                heap.count()
            );

            match self.execute_state(&mut state) {
                Ok(children) => {
                    for child in children {
                        if heap.count() >= self.setting.max_worklist_size {
                            self.drop_state(
                                child.cursor.clone(),
                                SymbolicError::BudgetExceeded(format!(
                                    "worklist holds {} states",
                                    heap.count()
                                )),
                            );
                        } else {
                            self.schedule(&mut heap, child);
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.at(&state.cursor)),
                Err(e) => self.drop_state(state.cursor.clone(), e),
            }
        }

        let store = std::mem::take(&mut self.symbolic_store);
        info!(
            "{} {}: {} completed, {} dropped, {} pruned",
            "🏁 Finished".green(),
            function_name.bright_yellow(),
            store.completed_paths.len(),
            store.dropped_paths.len(),
            store.pruned_branches
        );

        Ok(ExplorationReport {
            function: function_name.to_string(),
            completed_paths: store.completed_paths,
            dropped_paths: store.dropped_paths,
            states_explored: store.states_explored,
            pruned_branches: store.pruned_branches,
            solver_checks: self.oracle.checks - solver_checks_before,
            elapsed: started.elapsed(),
            stopped_early,
            coverage: self.coverage.clone(),
        })
    }

    /// Entry state: every parameter bound to a fresh input, block 0 entered.
    fn initial_state(&mut self, function: &Function) -> SymbolicResult<SymbolicState<'ctx>> {
        let mut memory = SymbolicMemory::new(self.ctx);
        for decl in &self.program.structs {
            memory.declare_struct(&decl.name, decl.fields.clone());
        }

        let mut state = SymbolicState::new(&function.name, memory);
        for param in &function.params {
            let (value, assumptions) =
                state
                    .memory
                    .new_input(&param.name, &param.ty, self.setting.max_array_len)?;
            for assumption in assumptions {
                state.push_constraint(assumption);
            }
            state.set_binding(&param.name, value.clone());
            self.symbolic_store.arguments.push(Argument {
                name: param.name.clone(),
                ty: param.ty.clone(),
                value,
            });
        }
        self.symbolic_store.entry_memory = Some(state.memory.clone());

        if function.blocks.is_empty() {
            return Err(SymbolicError::UnsupportedConstruct(format!(
                "function `{}` has no blocks",
                function.name
            )));
        }
        state.enter_block(0);
        state.priority = self.entry_priority(&state);
        Ok(state)
    }

    fn schedule<F>(
        &mut self,
        heap: &mut PriorityHeap<Box<SymbolicState<'ctx>>, F>,
        mut state: Box<SymbolicState<'ctx>>,
    ) where
        F: Fn(&Box<SymbolicState<'ctx>>, &Box<SymbolicState<'ctx>>) -> bool,
    {
        state.seq = self.next_seq;
        self.next_seq += 1;
        heap.insert(state);
    }

    fn drop_state(&mut self, location: Location, reason: SymbolicError) {
        warn!(
            "{} at {}: {}",
            "🗑️ Dropped state".yellow(),
            location,
            reason
        );
        self.symbolic_store
            .dropped_paths
            .push(DroppedPath { location, reason });
    }

    fn run_budget_exhausted(&self, started: Instant) -> Option<String> {
        if self.symbolic_store.states_explored >= self.setting.max_states {
            return Some(format!("explored {} states", self.symbolic_store.states_explored));
        }
        if let Some(timeout) = self.setting.timeout_ms {
            if started.elapsed() >= Duration::from_millis(timeout) {
                return Some(format!("timed out after {} ms", timeout));
            }
        }
        None
    }

    fn entry_priority(&mut self, state: &SymbolicState<'ctx>) -> i64 {
        match self.setting.strategy {
            SearchStrategy::Dfs => 0,
            _ => self.child_priority(0, state),
        }
    }

    /// Priority of a state forked from a parent of priority `parent`.
    fn child_priority(&mut self, parent: i64, state: &SymbolicState<'ctx>) -> i64 {
        match self.setting.strategy {
            SearchStrategy::Dfs => parent + 1,
            SearchStrategy::Random => self.rng.gen_range(0, i64::MAX),
            SearchStrategy::Nurs => {
                let program = self.program;
                let block = state.cursor.block;
                let (depth, branches) = match program.function(&state.cursor.function) {
                    Some(function) => {
                        let cfg = self.control_flow_info(function);
                        (cfg.depth(block), cfg.branch_count(block))
                    }
                    None => (0, 1),
                };
                (self.setting.nurs_alpha * depth as f64 + self.setting.nurs_beta * branches as f64)
                    .round() as i64
            }
        }
    }

    fn trace_if_enabled(&self, state: &SymbolicState<'ctx>, instr: &Instruction) {
        if !self.setting.off_trace {
            trace!(
                "({}) {} {}",
                state.cursor,
                instr.name().bright_blue(),
                state.lookup_fmt()
            );
        }
    }

    /// Runs `state` until it forks, completes, or fails.
    fn execute_state(
        &mut self,
        state: &mut SymbolicState<'ctx>,
    ) -> SymbolicResult<Vec<Box<SymbolicState<'ctx>>>> {
        let program = self.program;
        loop {
            let function = program
                .function(&state.cursor.function)
                .ok_or_else(|| SymbolicError::UnknownFunction(state.cursor.function.clone()))?;

            if state.cursor.instr == 0 {
                self.resolve_phis(state, function)?;
            }

            let instr = function
                .instruction(state.cursor.block, state.cursor.instr)
                .ok_or_else(|| {
                    SymbolicError::UnsupportedConstruct(format!(
                        "block {} of `{}` ends without a terminator",
                        state.cursor.block, function.name
                    ))
                })?;
            self.trace_if_enabled(state, instr);

            let flow = match instr {
                Instruction::BinOp { dest, op, lhs, rhs } => {
                    let lhs = self.evaluate_operand(state, lhs)?;
                    let rhs = self.evaluate_operand(state, rhs)?;
                    let value = evaluate_binary_op(self.ctx, *op, &lhs, &rhs)?;
                    self.bind_and_advance(state, dest, value)
                }
                Instruction::UnOp { dest, op, operand } => {
                    let operand = self.evaluate_operand(state, operand)?;
                    let value = evaluate_unary_op(self.ctx, *op, &operand)?;
                    self.bind_and_advance(state, dest, value)
                }
                Instruction::Convert { dest, operand, to } => {
                    let value = self.evaluate_operand(state, operand)?.convert(self.ctx, to)?;
                    self.bind_and_advance(state, dest, value)
                }
                Instruction::Phi { dest, .. } => {
                    return Err(SymbolicError::UnsupportedConstruct(format!(
                        "phi `{}` after the start of block {}",
                        dest, state.cursor.block
                    )))
                }
                Instruction::Alloc { dest, ty } => {
                    let ptr = state.memory.new_pointer(ty)?;
                    self.bind_and_advance(state, dest, SymbolicValue::Pointer(ptr))
                }
                Instruction::Store { addr, value } => self.handle_store(state, addr, value)?,
                Instruction::Load { dest, addr } => self.handle_load(state, dest, addr)?,
                Instruction::FieldAddr { dest, base, field } => {
                    self.handle_field_addr(state, dest, base, *field)?
                }
                Instruction::MakeArray { dest, elem, len } => {
                    self.handle_make_array(state, dest, elem, len)?
                }
                Instruction::IndexAddr { dest, array, index } => {
                    self.handle_index_addr(state, dest, array, index)?
                }
                Instruction::Len { dest, array } => {
                    let ptr = self.evaluate_operand(state, array)?.as_pointer()?.clone();
                    if !self.assume_dereferenceable(state, &ptr) {
                        Flow::Pruned
                    } else {
                        let length = state.memory.length(&ptr)?;
                        self.bind_and_advance(state, dest, length)
                    }
                }
                Instruction::Call {
                    dest,
                    callee,
                    args,
                    ret,
                } => self.handle_call(state, dest.as_deref(), callee, args, ret.as_ref())?,
                Instruction::Jump { target } => {
                    self.enter_block(state, *target)?;
                    Flow::Continue
                }
                Instruction::If {
                    cond,
                    then_block,
                    else_block,
                } => self.handle_if(state, cond, *then_block, *else_block)?,
                Instruction::Return { value } => self.handle_return(state, value.as_ref())?,
                Instruction::Unsupported { what } => {
                    return Err(SymbolicError::UnsupportedConstruct(what.clone()))
                }
            };

            match flow {
                Flow::Continue => {}
                Flow::Yield(children) => return Ok(children),
                Flow::Pruned => {
                    self.symbolic_store.pruned_branches += 1;
                    debug!("{} {}", "✂️ Pruned".red(), state.cursor);
                    return Ok(Vec::new());
                }
            }
        }
    }

    fn evaluate_operand(
        &self,
        state: &SymbolicState<'ctx>,
        operand: &Operand,
    ) -> SymbolicResult<SymbolicValue<'ctx>> {
        match operand {
            Operand::Var(name) => state.get_binding(name).cloned(),
            Operand::Int { value, width } => Ok(SymbolicValue::int(*value, *width)),
            Operand::Float { value, width } => Ok(SymbolicValue::float(*value, *width)),
            Operand::Bool(b) => Ok(SymbolicValue::ConstantBool(*b)),
            Operand::Nil(ty) => Ok(SymbolicValue::Pointer(Pointer::nil(ty.clone()))),
        }
    }

    fn bind_and_advance(
        &self,
        state: &mut SymbolicState<'ctx>,
        dest: &str,
        value: SymbolicValue<'ctx>,
    ) -> Flow<'ctx> {
        state.set_binding(dest, value);
        state.cursor.instr += 1;
        Flow::Continue
    }

    /// Enters `block` in the executing frame, enforcing the unroll bound.
    fn enter_block(&self, state: &mut SymbolicState<'ctx>, block: usize) -> SymbolicResult<()> {
        let visits = state.visit_count(block);
        if visits >= self.setting.max_block_visits {
            return Err(SymbolicError::BudgetExceeded(format!(
                "block {} of `{}` entered {} times",
                block, state.cursor.function, visits
            )));
        }
        state.enter_block(block);
        Ok(())
    }

    /// Adds `condition` to the path condition. Returns false when it is
    /// concretely false, meaning the path cannot continue.
    fn assume(&self, state: &mut SymbolicState<'ctx>, condition: &SymbolicValue<'ctx>) -> SymbolicResult<bool> {
        match condition {
            SymbolicValue::ConstantBool(b) => Ok(*b),
            other => {
                state.push_constraint(other.to_bool(self.ctx)?);
                Ok(true)
            }
        }
    }

    fn assume_dereferenceable(&self, state: &mut SymbolicState<'ctx>, ptr: &Pointer<'ctx>) -> bool {
        match &ptr.address {
            Address::Concrete(0) => false,
            Address::Concrete(_) => true,
            address => {
                if let Some(non_nil) = address.non_nil(self.ctx) {
                    state.push_constraint(non_nil);
                }
                true
            }
        }
    }

    /// Binds every phi at the start of the current block at once, each from
    /// the edge of the predecessor this path most recently came from.
    fn resolve_phis(&mut self, state: &mut SymbolicState<'ctx>, function: &Function) -> SymbolicResult<()> {
        let block = match function.block(state.cursor.block) {
            Some(block) => block,
            None => {
                return Err(SymbolicError::UnsupportedConstruct(format!(
                    "block {} of `{}` does not exist",
                    state.cursor.block, function.name
                )))
            }
        };

        let mut resolved = Vec::new();
        for instr in &block.instrs {
            let (dest, edges) = match instr {
                Instruction::Phi { dest, edges } => (dest, edges),
                _ => break,
            };
            let candidates: Vec<usize> = edges.iter().map(|e| e.block).collect();
            let from = state.arrived_from(&candidates).ok_or_else(|| {
                SymbolicError::UnsupportedConstruct(format!(
                    "phi `{}` in block {} has no visited predecessor",
                    dest, state.cursor.block
                ))
            })?;
            let edge: Option<&PhiEdge> = edges.iter().find(|e| e.block == from);
            if let Some(edge) = edge {
                resolved.push((dest.clone(), self.evaluate_operand(state, &edge.value)?));
            }
        }

        state.cursor.instr = resolved.len();
        for (dest, value) in resolved {
            state.set_binding(&dest, value);
        }
        Ok(())
    }

    fn handle_store(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        addr: &Operand,
        value: &Operand,
    ) -> SymbolicResult<Flow<'ctx>> {
        let ptr = self.evaluate_operand(state, addr)?.as_pointer()?.clone();
        let value = self.evaluate_operand(state, value)?;
        if !self.assume_dereferenceable(state, &ptr) {
            return Ok(Flow::Pruned);
        }
        state.memory.store(&ptr, &value)?;
        state.cursor.instr += 1;
        Ok(Flow::Continue)
    }

    fn handle_load(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        dest: &str,
        addr: &Operand,
    ) -> SymbolicResult<Flow<'ctx>> {
        let ptr = self.evaluate_operand(state, addr)?.as_pointer()?.clone();
        if !self.assume_dereferenceable(state, &ptr) {
            return Ok(Flow::Pruned);
        }
        let value = state.memory.load(&ptr)?;
        Ok(self.bind_and_advance(state, dest, value))
    }

    fn handle_field_addr(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        dest: &str,
        base: &Operand,
        field: usize,
    ) -> SymbolicResult<Flow<'ctx>> {
        let base = self.evaluate_operand(state, base)?.as_pointer()?.clone();
        if !self.assume_dereferenceable(state, &base) {
            return Ok(Flow::Pruned);
        }
        let ptr = state.memory.field_pointer(&base, field)?;
        Ok(self.bind_and_advance(state, dest, SymbolicValue::Pointer(ptr)))
    }

    fn handle_make_array(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        dest: &str,
        elem: &Type,
        len: &Operand,
    ) -> SymbolicResult<Flow<'ctx>> {
        let length = self.evaluate_operand(state, len)?.as_int(self.ctx, 64)?;
        if !length.is_concrete() {
            let zero = SymbolicValue::int(0, 64);
            let max = SymbolicValue::int(self.setting.max_array_len as i64, 64);
            let bounded = length
                .ge(self.ctx, &zero)?
                .bool_and(self.ctx, &length.le(self.ctx, &max)?)?;
            if !self.assume(state, &bounded)? {
                return Ok(Flow::Pruned);
            }
        }
        let ptr = state
            .memory
            .new_array(elem, &length, self.setting.max_array_len)?;
        Ok(self.bind_and_advance(state, dest, SymbolicValue::Pointer(ptr)))
    }

    fn handle_index_addr(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        dest: &str,
        array: &Operand,
        index: &Operand,
    ) -> SymbolicResult<Flow<'ctx>> {
        let ptr = self.evaluate_operand(state, array)?.as_pointer()?.clone();
        let index = self.evaluate_operand(state, index)?.as_int(self.ctx, 64)?;
        if !self.assume_dereferenceable(state, &ptr) {
            return Ok(Flow::Pruned);
        }

        let length = state.memory.length(&ptr)?;
        let in_bounds = index
            .ge(self.ctx, &SymbolicValue::int(0, 64))?
            .bool_and(self.ctx, &index.lt(self.ctx, &length)?)?;
        if !self.assume(state, &in_bounds)? {
            return Ok(Flow::Pruned);
        }

        let element = state.memory.element_pointer(&ptr, &index)?;
        Ok(self.bind_and_advance(state, dest, SymbolicValue::Pointer(element)))
    }

    fn handle_call(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        dest: Option<&str>,
        callee: &str,
        args: &[Operand],
        ret: Option<&Type>,
    ) -> SymbolicResult<Flow<'ctx>> {
        let values = args
            .iter()
            .map(|arg| self.evaluate_operand(state, arg))
            .collect::<SymbolicResult<Vec<_>>>()?;

        let program = self.program;
        if let Some(target) = program.function(callee) {
            if state.call_depth() + 1 > self.setting.max_call_depth {
                return Err(SymbolicError::BudgetExceeded(format!(
                    "call depth {} reached calling `{}`",
                    self.setting.max_call_depth, callee
                )));
            }
            if target.params.len() != values.len() {
                return Err(SymbolicError::UnsupportedConstruct(format!(
                    "`{}` expects {} arguments, got {}",
                    callee,
                    target.params.len(),
                    values.len()
                )));
            }
            if target.blocks.is_empty() {
                return Err(SymbolicError::UnsupportedConstruct(format!(
                    "function `{}` has no blocks",
                    callee
                )));
            }

            if !self.setting.off_trace {
                trace!("{}", "===========================".cyan());
                trace!("📞 Call {}", callee);
            }

            let site = CallSite {
                location: state.cursor.clone(),
                dest: dest.map(|d| d.to_string()),
            };
            state.push_frame(callee, site);
            state.cursor.function = callee.to_string();
            for (param, value) in target.params.iter().zip(values) {
                let value = if param.ty.is_primitive() {
                    value.convert(self.ctx, &param.ty)?
                } else {
                    value
                };
                state.set_binding(&param.name, value);
            }
            self.enter_block(state, 0)?;
            return Ok(Flow::Continue);
        }

        if !self.setting.mock_external_calls {
            return Err(SymbolicError::UnknownFunction(callee.to_string()));
        }

        let returned = match ret {
            Some(ty) if ty.is_primitive() => {
                Some(SymbolicValue::fresh_unique(self.ctx, callee, ty)?)
            }
            Some(ty) => {
                let (object, assumptions) =
                    state
                        .memory
                        .new_input(callee, ty, self.setting.max_array_len)?;
                for assumption in assumptions {
                    state.push_constraint(assumption);
                }
                Some(object)
            }
            None => None,
        };
        debug!("{} {}", "🎭 Mocked call to".magenta(), callee);
        state.record_external_call(callee, returned.clone(), ret.cloned());
        if let (Some(dest), Some(value)) = (dest, returned) {
            state.set_binding(dest, value);
        }
        state.cursor.instr += 1;
        Ok(Flow::Continue)
    }

    /// Forks on a symbolic condition; follows a concrete one directly.
    fn handle_if(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        cond: &Operand,
        then_block: usize,
        else_block: usize,
    ) -> SymbolicResult<Flow<'ctx>> {
        let cond = self.evaluate_operand(state, cond)?;
        if let Some(taken) = cond.as_concrete_bool() {
            self.enter_block(state, if taken { then_block } else { else_block })?;
            return Ok(Flow::Continue);
        }

        let condition = cond.to_bool(self.ctx)?;
        let mut children = Vec::new();
        // else first so that, at equal priority, the then-branch pops first
        for (constraint, target) in [(condition.not(), else_block), (condition, then_block)] {
            let mut child = state.copy();
            child.fork_depth += 1;
            child.push_constraint(constraint);
            if let Err(e) = self.enter_block(&mut child, target) {
                self.drop_state(child.cursor.clone(), e);
                continue;
            }
            match self.oracle.check(&child.path_constraints) {
                Feasibility::Feasible => {
                    child.priority = self.child_priority(state.priority, &child);
                    debug!("{} {} (priority={})", "🔀 Fork".cyan(), child.cursor, child.priority);
                    children.push(Box::new(child));
                }
                Feasibility::Infeasible => {
                    self.symbolic_store.pruned_branches += 1;
                    debug!("{} {}", "✂️ Infeasible branch".red(), child.cursor);
                }
                Feasibility::Unknown(reason) => {
                    self.drop_state(child.cursor.clone(), SymbolicError::SolverUnknown(reason));
                }
            }
        }
        Ok(Flow::Yield(children))
    }

    fn handle_return(
        &mut self,
        state: &mut SymbolicState<'ctx>,
        value: Option<&Operand>,
    ) -> SymbolicResult<Flow<'ctx>> {
        let returned = value
            .map(|v| self.evaluate_operand(state, v))
            .transpose()?;

        if state.frames.len() > 1 {
            let frame = state
                .pop_frame()
                .ok_or_else(|| SymbolicError::UnsupportedConstruct("empty call stack".to_string()))?;
            let site = frame.call_site.ok_or_else(|| {
                SymbolicError::UnsupportedConstruct("frame without a call site".to_string())
            })?;
            state.cursor = Location {
                function: site.location.function.clone(),
                block: site.location.block,
                instr: site.location.instr + 1,
            };
            if let (Some(dest), Some(value)) = (&site.dest, returned) {
                state.set_binding(dest, value);
            }
            if !self.setting.off_trace {
                trace!("{} {}", "🔙 Ret:".red(), state.cursor);
            }
            return Ok(Flow::Continue);
        }

        let return_type = self
            .program
            .function(&state.cursor.function)
            .and_then(|f| f.return_type.clone());
        let result = match &returned {
            Some(v) if v.value_type().is_primitive() => {
                let ty = match &return_type {
                    Some(ty) if ty.is_primitive() => ty.clone(),
                    _ => v.value_type(),
                };
                let result = SymbolicValue::fresh_unique(self.ctx, "result", &ty)?;
                let equal = result.eq(self.ctx, &v.convert(self.ctx, &ty)?)?;
                state.push_constraint(equal.to_bool(self.ctx)?);
                Some(result)
            }
            other => other.clone(),
        };

        match self.oracle.check(&state.path_constraints) {
            Feasibility::Feasible => {
                if !self.setting.off_trace {
                    trace!("{} {}", "🔙 Ret:".red(), state.lookup_fmt());
                }
                let blocks = state.entry_block_trace();
                self.coverage.record_trace(&blocks);
                let entry_memory = self
                    .symbolic_store
                    .entry_memory
                    .clone()
                    .unwrap_or_else(|| state.memory.clone());
                self.symbolic_store.completed_paths.push(CompletedPath {
                    function: state.cursor.function.clone(),
                    arguments: self.symbolic_store.arguments.clone(),
                    constraints: state.path_constraints.clone(),
                    result,
                    returned,
                    return_type,
                    entry_memory,
                    blocks,
                    external_calls: state.external_calls.clone(),
                });
                Ok(Flow::Yield(Vec::new()))
            }
            Feasibility::Infeasible => Ok(Flow::Pruned),
            Feasibility::Unknown(reason) => Err(SymbolicError::SolverUnknown(reason)),
        }
    }
}
