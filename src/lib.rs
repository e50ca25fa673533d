pub mod executor;
pub mod program;
pub mod stats;
pub mod synthesizer;

pub mod input_user;
pub mod parser_user;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
