use std::rc::Rc;

use colored::Colorize;
use rustc_hash::FxHashMap;
use z3::ast::Bool;

use crate::executor::error::{SymbolicError, SymbolicResult};
use crate::executor::symbolic_memory::SymbolicMemory;
use crate::executor::symbolic_value::SymbolicValue;
use crate::executor::utils::italic;
use crate::program::{Location, Type};

pub type SymbolBindingMap<'ctx> = FxHashMap<String, SymbolicValue<'ctx>>;

/// The call instruction a frame returns to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CallSite {
    pub location: Location,
    pub dest: Option<String>,
}

/// Variable bindings of one activation.
///
/// The binding table is shared between forked states until one of them
/// writes to it.
#[derive(Clone)]
pub struct StackFrame<'ctx> {
    pub function: String,
    pub bindings: Rc<SymbolBindingMap<'ctx>>,
    pub call_site: Option<CallSite>,
    /// Length of the visited-block history when this frame was entered.
    pub visit_base: usize,
}

impl<'ctx> StackFrame<'ctx> {
    pub fn new(function: &str, call_site: Option<CallSite>, visit_base: usize) -> Self {
        StackFrame {
            function: function.to_string(),
            bindings: Rc::new(SymbolBindingMap::default()),
            call_site,
            visit_base,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BlockVisit {
    pub function: String,
    pub block: usize,
    /// Call depth of the frame that entered the block.
    pub depth: usize,
}

/// One observed call to a function the interpreter does not model.
#[derive(Clone)]
pub struct ExternalCall<'ctx> {
    pub memory: SymbolicMemory<'ctx>,
    pub returned: Option<SymbolicValue<'ctx>>,
    pub declared_type: Option<Type>,
}

pub type ExternalCallHistory<'ctx> = FxHashMap<String, Vec<ExternalCall<'ctx>>>;

/// One explored path: call stack, path condition, cursor, visited blocks
/// and memory.
#[derive(Clone)]
pub struct SymbolicState<'ctx> {
    pub frames: Vec<StackFrame<'ctx>>,
    pub path_constraints: Vec<Bool<'ctx>>,
    pub cursor: Location,
    pub visited: Rc<Vec<BlockVisit>>,
    pub memory: SymbolicMemory<'ctx>,
    pub external_calls: Rc<ExternalCallHistory<'ctx>>,
    pub priority: i64,
    /// Insertion order in the worklist, set by the scheduler.
    pub seq: u64,
    /// Number of forks on the way to this state.
    pub fork_depth: usize,
}

impl<'ctx> SymbolicState<'ctx> {
    /// Creates the entry state of `function` with one empty frame.
    pub fn new(function: &str, memory: SymbolicMemory<'ctx>) -> Self {
        SymbolicState {
            frames: vec![StackFrame::new(function, None, 0)],
            path_constraints: Vec::new(),
            cursor: Location {
                function: function.to_string(),
                block: 0,
                instr: 0,
            },
            visited: Rc::new(Vec::new()),
            memory,
            external_calls: Rc::new(ExternalCallHistory::default()),
            priority: 0,
            seq: 0,
            fork_depth: 0,
        }
    }

    /// Returns an independent copy of this state.
    ///
    /// Frames, history and memory are structurally shared and copied on the
    /// first write of either side, so a copy costs O(frames), not
    /// O(bindings).
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn push_frame(&mut self, function: &str, call_site: CallSite) {
        let base = self.visited.len();
        self.frames
            .push(StackFrame::new(function, Some(call_site), base));
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame<'ctx>> {
        self.frames.pop()
    }

    pub fn last_frame(&self) -> Option<&StackFrame<'ctx>> {
        self.frames.last()
    }

    /// Call depth of the executing frame, 0 for the entry function.
    pub fn call_depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn get_binding(&self, name: &str) -> SymbolicResult<&SymbolicValue<'ctx>> {
        self.last_frame()
            .and_then(|frame| frame.bindings.get(name))
            .ok_or_else(|| SymbolicError::UndefinedVariable(name.to_string()))
    }

    pub fn set_binding(&mut self, name: &str, value: SymbolicValue<'ctx>) {
        if let Some(frame) = self.frames.last_mut() {
            Rc::make_mut(&mut frame.bindings).insert(name.to_string(), value);
        }
    }

    pub fn push_constraint(&mut self, constraint: Bool<'ctx>) {
        self.path_constraints.push(constraint);
    }

    /// Moves the cursor to the start of `block` in the executing function
    /// and appends it to the visited history.
    pub fn enter_block(&mut self, block: usize) {
        let depth = self.call_depth();
        let function = self.cursor.function.clone();
        Rc::make_mut(&mut self.visited).push(BlockVisit {
            function: function.clone(),
            block,
            depth,
        });
        self.cursor = Location {
            function,
            block,
            instr: 0,
        };
    }

    /// How many times the executing frame has entered `block`.
    pub fn visit_count(&self, block: usize) -> usize {
        let base = self.last_frame().map(|f| f.visit_base).unwrap_or(0);
        let depth = self.call_depth();
        self.visited[base.min(self.visited.len())..]
            .iter()
            .filter(|v| v.depth == depth && v.block == block && v.function == self.cursor.function)
            .count()
    }

    /// Finds the block the executing frame came from before entering the
    /// current one, preferring the most recent visit among `candidates`.
    pub fn arrived_from(&self, candidates: &[usize]) -> Option<usize> {
        let base = self.last_frame().map(|f| f.visit_base).unwrap_or(0);
        let depth = self.call_depth();
        let end = self.visited.len().saturating_sub(1);
        self.visited[base.min(end)..end]
            .iter()
            .rev()
            .filter(|v| v.depth == depth && v.function == self.cursor.function)
            .find(|v| candidates.contains(&v.block))
            .map(|v| v.block)
    }

    /// Blocks visited by the entry function, in order.
    pub fn entry_block_trace(&self) -> Vec<usize> {
        self.visited
            .iter()
            .filter(|v| v.depth == 0)
            .map(|v| v.block)
            .collect()
    }

    pub fn record_external_call(
        &mut self,
        callee: &str,
        returned: Option<SymbolicValue<'ctx>>,
        declared_type: Option<Type>,
    ) {
        let snapshot = self.memory.clone();
        Rc::make_mut(&mut self.external_calls)
            .entry(callee.to_string())
            .or_default()
            .push(ExternalCall {
                memory: snapshot,
                returned,
                declared_type,
            });
    }

    pub fn lookup_fmt(&self) -> String {
        let mut s = "".to_string();
        s += &format!("🛠️ {}", "SymbolicState [\n".cyan());
        s += &format!(
            "  {} {}\n",
            "📍 cursor:".cyan(),
            italic(&format!("{}", self.cursor)).magenta()
        );
        s += &format!(
            "  {} {} {} {}\n",
            "📏 depth:".cyan(),
            self.call_depth(),
            "priority:".cyan(),
            self.priority
        );
        s += &format!("  📋 {}\n", "values:".cyan());
        if let Some(frame) = self.last_frame() {
            let mut names: Vec<&String> = frame.bindings.keys().collect();
            names.sort();
            for name in names {
                s += &format!("      {}: {}\n", name, frame.bindings[name].lookup_fmt());
            }
        }
        s += &format!(
            "  {} {}\n",
            "🪶 path_constraints:".cyan(),
            self.path_constraints
                .iter()
                .map(|c| format!("{}", c))
                .collect::<Vec<_>>()
                .join(", ")
                .replace('\n', "")
                .replace("  ", " ")
        );
        s += &format!(
            "  {} {}\n",
            "👣 visited:".cyan(),
            self.visited
                .iter()
                .map(|v| format!("{}:b{}", v.function, v.block))
                .collect::<Vec<_>>()
                .join(" → ")
        );
        s += &format!("{}\n", "]".cyan());
        s
    }
}
