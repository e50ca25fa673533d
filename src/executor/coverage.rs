use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::program::ControlFlowInfo;

/// Tracks which CFG edges and which distinct block sequences the completed
/// paths of a run have exercised.
///
/// Paths are hashed with `FxHasher`; two paths count as the same when they
/// visit the same blocks in the same order.
///
/// # Example
/// ```rust
/// use pathsynth::executor::coverage::CoverageTracker;
///
/// let mut tracker = CoverageTracker::new();
///
/// tracker.record_block(0);
/// tracker.record_block(1);
/// tracker.record_path();
/// assert_eq!(tracker.coverage_count(), 1);
///
/// tracker.clear_current_path();
/// tracker.record_block(0);
/// tracker.record_block(2);
/// tracker.record_path();
/// assert_eq!(tracker.coverage_count(), 2);
/// assert_eq!(tracker.edge_count(), 2);
///
/// tracker.clear();
/// assert_eq!(tracker.coverage_count(), 0);
/// ```
#[derive(Clone, Default, Debug)]
pub struct CoverageTracker {
    paths: FxHashSet<u64>,
    edges: FxHashSet<(usize, usize)>,
    visit_counter: FxHashMap<usize, usize>,
    current_path: Vec<usize>,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block(&mut self, block: usize) {
        *self.visit_counter.entry(block).or_insert(0) += 1;
        if let Some(&previous) = self.current_path.last() {
            self.edges.insert((previous, block));
        }
        self.current_path.push(block);
    }

    /// Records a whole block sequence as one completed path.
    pub fn record_trace(&mut self, blocks: &[usize]) {
        self.clear_current_path();
        for &block in blocks {
            self.record_block(block);
        }
        self.record_path();
    }

    pub fn record_path(&mut self) {
        let path_hash = self.hash_current_path();
        self.paths.insert(path_hash);
    }

    fn hash_current_path(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.current_path.hash(&mut hasher);
        hasher.finish()
    }

    pub fn clear(&mut self) {
        self.clear_current_path();
        self.paths.clear();
        self.edges.clear();
    }

    pub fn clear_current_path(&mut self) {
        self.visit_counter.clear();
        self.current_path.clear();
    }

    /// Number of distinct block sequences recorded.
    pub fn coverage_count(&self) -> usize {
        self.paths.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn covers_edge(&self, from: usize, to: usize) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Fraction of the function's CFG edges exercised so far.
    pub fn edge_coverage(&self, cfg: &ControlFlowInfo) -> f64 {
        let total = cfg.edge_count();
        if total == 0 {
            return 1.0;
        }
        let covered = self
            .edges
            .iter()
            .filter(|(from, to)| cfg.successors.get(*from).map_or(false, |s| s.contains(to)))
            .count();
        covered as f64 / total as f64
    }
}
