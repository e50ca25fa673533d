use std::fmt;
use std::fs::File;
use std::str::FromStr;

use colored::Colorize;
use log::info;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Order in which the worklist hands out states.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchStrategy {
    /// Child priority is parent priority plus one.
    Dfs,
    /// Uniformly random priorities from a seeded generator.
    Random,
    /// `alpha * depth + beta * branch_count` of the block a state is in.
    Nurs,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dfs" => Ok(SearchStrategy::Dfs),
            "random" => Ok(SearchStrategy::Random),
            "nurs" => Ok(SearchStrategy::Nurs),
            other => Err(format!("unknown search strategy `{}`", other)),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::Dfs => "dfs",
            SearchStrategy::Random => "random",
            SearchStrategy::Nurs => "nurs",
        };
        write!(f, "{}", name)
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolicExecutorSetting {
    #[serde_as(as = "DisplayFromStr")]
    pub strategy: SearchStrategy,
    pub seed: u64,
    pub nurs_alpha: f64,
    pub nurs_beta: f64,
    pub max_states: usize,
    pub max_block_visits: usize,
    pub max_call_depth: usize,
    pub max_worklist_size: usize,
    pub timeout_ms: Option<u64>,
    pub solver_timeout_ms: Option<u32>,
    pub max_array_len: usize,
    pub mock_external_calls: bool,
    pub max_model_depth: usize,
    pub off_trace: bool,
}

impl Default for SymbolicExecutorSetting {
    fn default() -> Self {
        get_default_setting_for_symbolic_execution()
    }
}

pub fn get_default_setting_for_symbolic_execution() -> SymbolicExecutorSetting {
    SymbolicExecutorSetting {
        strategy: SearchStrategy::Dfs,
        seed: 0,
        nurs_alpha: 1.0,
        nurs_beta: 2.0,
        max_states: 10_000,
        max_block_visits: 128,
        max_call_depth: 64,
        max_worklist_size: 100_000,
        timeout_ms: None,
        solver_timeout_ms: Some(10_000),
        max_array_len: 4,
        mock_external_calls: true,
        max_model_depth: 3,
        off_trace: true,
    }
}

fn or_unbounded<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

impl fmt::Display for SymbolicExecutorSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🔎 Exploration Settings:
    ├─ Search Strategy             : {}
    ├─ Seed                        : {}
    ├─ NURS Coefficients (α, β)    : ({}, {})
    ├─ Maximum Explored States     : {}
    ├─ Maximum Visits per Block    : {}
    ├─ Maximum Call Depth          : {}
    ├─ Maximum Worklist Size       : {}
    ├─ Timeout (ms)                : {}
    ├─ Solver Timeout (ms)         : {}
    ├─ Maximum Input Array Length  : {}
    └─ Mock External Calls         : {}",
            self.strategy.to_string().bright_yellow(),
            self.seed.to_string().bright_yellow(),
            self.nurs_alpha.to_string().bright_yellow(),
            self.nurs_beta.to_string().bright_yellow(),
            self.max_states.to_string().bright_yellow(),
            self.max_block_visits.to_string().bright_yellow(),
            self.max_call_depth.to_string().bright_yellow(),
            self.max_worklist_size.to_string().bright_yellow(),
            or_unbounded(self.timeout_ms).bright_yellow(),
            or_unbounded(self.solver_timeout_ms).bright_yellow(),
            self.max_array_len.to_string().bright_yellow(),
            self.mock_external_calls.to_string().bright_yellow(),
        )
    }
}

/// Reads settings from a JSON file; a missing file yields the defaults.
pub fn load_setting_from_json(file_path: &str) -> Result<SymbolicExecutorSetting, serde_json::Error> {
    match File::open(file_path) {
        Ok(file) => serde_json::from_reader(file),
        Err(_) => {
            info!("Use the default setting for symbolic execution");
            Ok(SymbolicExecutorSetting::default())
        }
    }
}
