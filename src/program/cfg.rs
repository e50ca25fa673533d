use rustc_hash::FxHashSet;

use crate::program::function::{Function, Instruction};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TerminatorKind {
    If,
    Jump,
    Return,
    Other,
}

impl TerminatorKind {
    /// Number of successors a state leaving a block of this kind will produce.
    pub fn branch_count(&self) -> usize {
        match self {
            TerminatorKind::If => 2,
            TerminatorKind::Return => 0,
            TerminatorKind::Jump | TerminatorKind::Other => 1,
        }
    }
}

/// Control-flow facts about one function that the scheduler and the
/// interpreter query repeatedly.
#[derive(Clone, Debug)]
pub struct ControlFlowInfo {
    pub predecessors: Vec<Vec<usize>>,
    pub successors: Vec<Vec<usize>>,
    pub terminators: Vec<TerminatorKind>,
    /// Longest predecessor chain from the entry block, back edges ignored.
    pub depths: Vec<usize>,
    pub back_edges: FxHashSet<(usize, usize)>,
}

impl ControlFlowInfo {
    pub fn new(function: &Function) -> Self {
        let n = function.blocks.len();
        let mut predecessors = vec![Vec::new(); n];
        let mut successors = vec![Vec::new(); n];
        let mut terminators = vec![TerminatorKind::Other; n];

        for (i, block) in function.blocks.iter().enumerate() {
            terminators[i] = match block.terminator() {
                Some(Instruction::If { .. }) => TerminatorKind::If,
                Some(Instruction::Jump { .. }) => TerminatorKind::Jump,
                Some(Instruction::Return { .. }) => TerminatorKind::Return,
                _ => TerminatorKind::Other,
            };
            if let Some(term) = block.terminator() {
                for t in term.targets() {
                    if t < n {
                        successors[i].push(t);
                        if !predecessors[t].contains(&i) {
                            predecessors[t].push(i);
                        }
                    }
                }
            }
        }

        let back_edges = find_back_edges(&successors);
        let depths = longest_chain_depths(&successors, &back_edges);

        ControlFlowInfo {
            predecessors,
            successors,
            terminators,
            depths,
            back_edges,
        }
    }

    pub fn depth(&self, block: usize) -> usize {
        self.depths.get(block).copied().unwrap_or(0)
    }

    pub fn branch_count(&self, block: usize) -> usize {
        self.terminators
            .get(block)
            .map(|t| t.branch_count())
            .unwrap_or(1)
    }

    pub fn is_back_edge(&self, from: usize, to: usize) -> bool {
        self.back_edges.contains(&(from, to))
    }

    /// Total number of distinct CFG edges, used as the coverage denominator.
    pub fn edge_count(&self) -> usize {
        self.successors
            .iter()
            .map(|s| s.iter().collect::<FxHashSet<_>>().len())
            .sum()
    }
}

fn find_back_edges(successors: &[Vec<usize>]) -> FxHashSet<(usize, usize)> {
    let n = successors.len();
    let mut back_edges = FxHashSet::default();
    if n == 0 {
        return back_edges;
    }

    // 0 = unvisited, 1 = on stack, 2 = finished
    let mut color = vec![0u8; n];
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    color[0] = 1;

    while let Some((node, next_child)) = stack.pop() {
        if next_child < successors[node].len() {
            stack.push((node, next_child + 1));
            let child = successors[node][next_child];
            match color[child] {
                0 => {
                    color[child] = 1;
                    stack.push((child, 0));
                }
                1 => {
                    back_edges.insert((node, child));
                }
                _ => {}
            }
        } else {
            color[node] = 2;
        }
    }
    back_edges
}

fn longest_chain_depths(
    successors: &[Vec<usize>],
    back_edges: &FxHashSet<(usize, usize)>,
) -> Vec<usize> {
    let n = successors.len();
    let mut depths = vec![0usize; n];
    if n == 0 {
        return depths;
    }

    // Reverse postorder of the forward-edge DAG reachable from the entry.
    let mut visited = vec![false; n];
    let mut postorder = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    visited[0] = true;
    while let Some((node, next_child)) = stack.pop() {
        if next_child < successors[node].len() {
            stack.push((node, next_child + 1));
            let child = successors[node][next_child];
            if !visited[child] && !back_edges.contains(&(node, child)) {
                visited[child] = true;
                stack.push((child, 0));
            }
        } else {
            postorder.push(node);
        }
    }

    for &node in postorder.iter().rev() {
        for &child in &successors[node] {
            if !back_edges.contains(&(node, child)) && depths[child] < depths[node] + 1 {
                depths[child] = depths[node] + 1;
            }
        }
    }
    depths
}
