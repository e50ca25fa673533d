//! Fluent construction of programs in code.
//!
//! Front-ends that do not go through JSON can assemble functions block by
//! block with these helpers:
//!
//! ```
//! use pathsynth::program::builder::{bin, branch, ret, var};
//! use pathsynth::program::{BinaryOp, FunctionBuilder, ProgramBuilder, Type};
//!
//! let program = ProgramBuilder::new()
//!     .function(
//!         FunctionBuilder::new("max")
//!             .param("a", Type::int(64))
//!             .param("b", Type::int(64))
//!             .returns(Type::int(64))
//!             .block(vec![bin("c", BinaryOp::Gt, var("a"), var("b")), branch(var("c"), 1, 2)])
//!             .block(vec![ret(var("a"))])
//!             .block(vec![ret(var("b"))])
//!             .build(),
//!     )
//!     .build();
//! assert_eq!(program.function("max").unwrap().blocks.len(), 3);
//! ```

use crate::program::function::{
    BasicBlock, BinaryOp, Function, Instruction, Operand, Param, PhiEdge, Program, StructDecl,
    UnaryOp,
};
use crate::program::types::Type;

#[derive(Default)]
pub struct ProgramBuilder {
    structs: Vec<StructDecl>,
    functions: Vec<Function>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, name: &str, fields: Vec<Type>) -> Self {
        self.structs.push(StructDecl {
            name: name.to_string(),
            fields,
        });
        self
    }

    pub fn function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    pub fn build(self) -> Program {
        Program {
            structs: self.structs,
            functions: self.functions,
        }
    }
}

pub struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
    return_type: Option<Type>,
    blocks: Vec<BasicBlock>,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        FunctionBuilder {
            name: name.to_string(),
            params: Vec::new(),
            return_type: None,
            blocks: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, ty: Type) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Appends a block; its index is the number of blocks added before it.
    pub fn block(mut self, instrs: Vec<Instruction>) -> Self {
        let index = self.blocks.len();
        self.blocks.push(BasicBlock { index, instrs });
        self
    }

    pub fn build(self) -> Function {
        Function {
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            blocks: self.blocks,
        }
    }
}

pub fn var(name: &str) -> Operand {
    Operand::var(name)
}

pub fn int(value: i64) -> Operand {
    Operand::int(value)
}

pub fn float(value: f64) -> Operand {
    Operand::float(value)
}

pub fn bin(dest: &str, op: BinaryOp, lhs: Operand, rhs: Operand) -> Instruction {
    Instruction::BinOp {
        dest: dest.to_string(),
        op,
        lhs,
        rhs,
    }
}

pub fn un(dest: &str, op: UnaryOp, operand: Operand) -> Instruction {
    Instruction::UnOp {
        dest: dest.to_string(),
        op,
        operand,
    }
}

pub fn convert(dest: &str, operand: Operand, to: Type) -> Instruction {
    Instruction::Convert {
        dest: dest.to_string(),
        operand,
        to,
    }
}

pub fn phi(dest: &str, edges: Vec<(usize, Operand)>) -> Instruction {
    Instruction::Phi {
        dest: dest.to_string(),
        edges: edges
            .into_iter()
            .map(|(block, value)| PhiEdge { block, value })
            .collect(),
    }
}

pub fn alloc(dest: &str, ty: Type) -> Instruction {
    Instruction::Alloc {
        dest: dest.to_string(),
        ty,
    }
}

pub fn store(addr: Operand, value: Operand) -> Instruction {
    Instruction::Store { addr, value }
}

pub fn load(dest: &str, addr: Operand) -> Instruction {
    Instruction::Load {
        dest: dest.to_string(),
        addr,
    }
}

pub fn field_addr(dest: &str, base: Operand, field: usize) -> Instruction {
    Instruction::FieldAddr {
        dest: dest.to_string(),
        base,
        field,
    }
}

pub fn make_array(dest: &str, elem: Type, len: Operand) -> Instruction {
    Instruction::MakeArray {
        dest: dest.to_string(),
        elem,
        len,
    }
}

pub fn index_addr(dest: &str, array: Operand, index: Operand) -> Instruction {
    Instruction::IndexAddr {
        dest: dest.to_string(),
        array,
        index,
    }
}

pub fn len(dest: &str, array: Operand) -> Instruction {
    Instruction::Len {
        dest: dest.to_string(),
        array,
    }
}

pub fn call(dest: Option<&str>, callee: &str, args: Vec<Operand>, ret: Option<Type>) -> Instruction {
    Instruction::Call {
        dest: dest.map(|d| d.to_string()),
        callee: callee.to_string(),
        args,
        ret,
    }
}

pub fn jump(target: usize) -> Instruction {
    Instruction::Jump { target }
}

pub fn branch(cond: Operand, then_block: usize, else_block: usize) -> Instruction {
    Instruction::If {
        cond,
        then_block,
        else_block,
    }
}

pub fn ret(value: Operand) -> Instruction {
    Instruction::Return { value: Some(value) }
}

pub fn ret_void() -> Instruction {
    Instruction::Return { value: None }
}
