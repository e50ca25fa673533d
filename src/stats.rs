pub mod symbolic_stats;
