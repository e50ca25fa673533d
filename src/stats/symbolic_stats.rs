use rustc_hash::FxHashMap;

use crate::executor::symbolic_execution::{CompletedPath, ExplorationReport};

const RESET: &str = "\x1b[0m";
const WHITE: &str = "\x1b[37m";
const BBLACK: &str = "\x1b[90m";

/// Operators reported individually, by their SMT-LIB names.
const TRACKED_OPERATORS: [&str; 20] = [
    "bvadd", "bvsub", "bvmul", "bvsdiv", "bvsrem", "bvshl", "bvashr", "bvand", "bvor", "bvxor",
    "bvslt", "bvsle", "bvsgt", "bvsge", "+", "*", "/", "=", "not", "and",
];

/// Collects statistics over the paths of one or more exploration runs.
#[derive(Default, Debug)]
pub struct PathStatistics {
    pub completed_paths: usize,
    pub dropped_paths: usize,
    pub pruned_branches: usize,
    pub states_explored: usize,
    pub solver_checks: usize,
    pub constraint_counts: Vec<usize>,
    pub constraint_depths: Vec<usize>,
    pub path_lengths: Vec<usize>,
    pub operator_counts: FxHashMap<String, usize>,
    pub dropped_reasons: FxHashMap<String, usize>,
}

fn average(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

fn maximum(values: &[usize]) -> usize {
    values.iter().copied().max().unwrap_or(0)
}

impl PathStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one printed constraint: its nesting depth and the operators
    /// heading each parenthesised term.
    fn update_from_constraint(&mut self, text: &str) {
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '(' => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                    let rest = &text[i + 1..];
                    let op: String = rest
                        .chars()
                        .take_while(|c| !c.is_whitespace() && *c != '(' && *c != ')')
                        .collect();
                    if !op.is_empty() {
                        *self.operator_counts.entry(op).or_insert(0) += 1;
                    }
                }
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        self.constraint_depths.push(max_depth);
    }

    pub fn update(&mut self, path: &CompletedPath) {
        self.completed_paths += 1;
        self.constraint_counts.push(path.constraints.len());
        self.path_lengths.push(path.blocks.len());
        for constraint in &path.constraints {
            self.update_from_constraint(&format!("{}", constraint));
        }
    }

    pub fn update_from_report(&mut self, report: &ExplorationReport) {
        for path in &report.completed_paths {
            self.update(path);
        }
        self.dropped_paths += report.dropped_paths.len();
        self.pruned_branches += report.pruned_branches;
        self.states_explored += report.states_explored;
        self.solver_checks += report.solver_checks;
        for (reason, count) in report.dropped_reasons() {
            *self.dropped_reasons.entry(reason.to_string()).or_insert(0) += count;
        }
    }

    pub fn total_constraints(&self) -> usize {
        self.constraint_counts.iter().sum()
    }
}

pub fn print_path_summary_statistics_pretty(stats: &PathStatistics) {
    println!(" ┌─────────────────────┬─────────────┐");
    println!(" │ Path Outcome        │     Count   │");
    println!(" ├─────────────────────┼─────────────┤");
    println!(" │ Completed           │ {:11} │", stats.completed_paths);
    println!(" │ Dropped             │ {:11} │", stats.dropped_paths);
    println!(" │ Pruned Branches     │ {:11} │", stats.pruned_branches);
    println!(" │ States Explored     │ {:11} │", stats.states_explored);
    println!(" │ Solver Checks       │ {:11} │", stats.solver_checks);
    println!(" └─────────────────────┴─────────────┘");

    println!("\n📏 Path Length Statistics:");
    println!(" • Average Blocks : {:.2}", average(&stats.path_lengths));
    println!(" • Maximum Blocks : {}", maximum(&stats.path_lengths));

    println!("\n📊 Path Condition Statistics:");
    println!(" • Total Constraints  : {}", stats.total_constraints());
    println!(" • Average per Path   : {:.2}", average(&stats.constraint_counts));
    println!(" • Average Depth      : {:.2}", average(&stats.constraint_depths));
    println!(" • Maximum Depth      : {}", maximum(&stats.constraint_depths));

    println!("\n🔢 Operator Counts:");
    for op in TRACKED_OPERATORS.iter() {
        let c = stats.operator_counts.get(*op).unwrap_or(&0);
        println!(
            " • {:<8}: {}{}{}",
            op,
            if *c != 0 { WHITE } else { BBLACK },
            c,
            RESET
        );
    }

    if !stats.dropped_reasons.is_empty() {
        println!("\n🗑️ Dropped Paths by Reason:");
        let mut reasons: Vec<_> = stats.dropped_reasons.iter().collect();
        reasons.sort();
        for (reason, count) in reasons {
            println!(" • {:<22}: {}", reason, count);
        }
    }
}

pub fn path_summary_csv_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "Completed_Paths",
        "Dropped_Paths",
        "Pruned_Branches",
        "States_Explored",
        "Solver_Checks",
        "Avg_Path_Length",
        "Max_Path_Length",
        "Total_Constraints",
        "Avg_Constraints",
        "Avg_Depth",
        "Max_Depth",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for op in TRACKED_OPERATORS.iter() {
        headers.push(format!("Count_{}", op));
    }
    headers
}

pub fn path_summary_csv_row(stats: &PathStatistics) -> String {
    let mut values = vec![
        stats.completed_paths.to_string(),
        stats.dropped_paths.to_string(),
        stats.pruned_branches.to_string(),
        stats.states_explored.to_string(),
        stats.solver_checks.to_string(),
        format!("{:.2}", average(&stats.path_lengths)),
        maximum(&stats.path_lengths).to_string(),
        stats.total_constraints().to_string(),
        format!("{:.2}", average(&stats.constraint_counts)),
        format!("{:.2}", average(&stats.constraint_depths)),
        maximum(&stats.constraint_depths).to_string(),
    ];
    for op in TRACKED_OPERATORS.iter() {
        values.push(stats.operator_counts.get(*op).unwrap_or(&0).to_string());
    }
    values.join(",")
}

pub fn print_path_summary_statistics_csv(stats: &PathStatistics) {
    println!("{}", path_summary_csv_row(stats));
}
