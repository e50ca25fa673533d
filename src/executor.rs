pub mod coverage;
pub mod error;
pub mod feasibility;
pub mod priority_heap;
pub mod symbolic_execution;
pub mod symbolic_memory;
pub mod symbolic_setting;
pub mod symbolic_state;
pub mod symbolic_value;
pub mod utils;
