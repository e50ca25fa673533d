use thiserror::Error;

use crate::program::Location;

pub type SymbolicResult<T> = std::result::Result<T, SymbolicError>;

/// Failures raised while interpreting one state.
///
/// Everything except `TypeMismatch` is scoped to the state that raised it:
/// the executor drops that state, records why, and keeps draining the
/// worklist. A type mismatch means the interpreter itself is inconsistent
/// and halts the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SymbolicError {
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    #[error("unknown structure `{0}`")]
    UnknownStructure(String),
    #[error("unknown field {index} of structure `{structure}`")]
    UnknownField { structure: String, index: usize },
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("solver could not decide feasibility: {0}")]
    SolverUnknown(String),
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),
    #[error("type mismatch in `{op}`: {lhs} vs {rhs}{}", location_suffix(.location))]
    TypeMismatch {
        op: String,
        lhs: String,
        rhs: String,
        location: Option<Location>,
    },
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

impl SymbolicError {
    pub fn type_mismatch(op: &str, lhs: &str, rhs: &str) -> Self {
        SymbolicError::TypeMismatch {
            op: op.to_string(),
            lhs: lhs.to_string(),
            rhs: rhs.to_string(),
            location: None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SymbolicError::TypeMismatch { .. })
    }

    /// Attaches the instruction location to a type mismatch that was raised
    /// deep inside the value algebra, where the location is not known.
    pub fn at(self, loc: &Location) -> Self {
        match self {
            SymbolicError::TypeMismatch {
                op,
                lhs,
                rhs,
                location: None,
            } => SymbolicError::TypeMismatch {
                op,
                lhs,
                rhs,
                location: Some(loc.clone()),
            },
            other => other,
        }
    }

    /// Short machine-friendly label used to group dropped paths in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SymbolicError::UnsupportedConstruct(_) => "unsupported_construct",
            SymbolicError::UnknownStructure(_) => "unknown_structure",
            SymbolicError::UnknownField { .. } => "unknown_field",
            SymbolicError::UndefinedVariable(_) => "undefined_variable",
            SymbolicError::UnknownFunction(_) => "unknown_function",
            SymbolicError::SolverUnknown(_) => "solver_unknown",
            SymbolicError::BudgetExceeded(_) => "budget_exceeded",
            SymbolicError::TypeMismatch { .. } => "type_mismatch",
        }
    }
}
