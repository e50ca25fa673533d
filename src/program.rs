pub mod builder;
pub mod cfg;
pub mod function;
pub mod types;

pub use builder::{FunctionBuilder, ProgramBuilder};
pub use cfg::{ControlFlowInfo, TerminatorKind};
pub use function::{
    BasicBlock, BinaryOp, Function, Instruction, Location, Operand, Param, PhiEdge, Program,
    StructDecl, UnaryOp,
};
pub use types::Type;
