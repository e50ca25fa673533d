use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::program::types::Type;

/// An instruction operand: either a named SSA value or a literal.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Var(String),
    Int { value: i64, width: u32 },
    Float { value: f64, width: u32 },
    Bool(bool),
    Nil(Type),
}

impl Operand {
    pub fn var(name: &str) -> Self {
        Operand::Var(name.to_string())
    }

    pub fn int(value: i64) -> Self {
        Operand::Int { value, width: 64 }
    }

    pub fn float(value: f64) -> Self {
        Operand::Float { value, width: 64 }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Int { value, width } => write!(f, "{}:int{}", value, width),
            Operand::Float { value, width } => write!(f, "{}:float{}", value, width),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::Nil(ty) => write!(f, "nil:*{}", ty),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    NotEq,
    BoolAnd,
    BoolOr,
    BoolXor,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::NotEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::BoolAnd | BinaryOp::BoolOr | BinaryOp::BoolXor)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PhiEdge {
    pub block: usize,
    pub value: Operand,
}

/// One instruction of a basic block.
///
/// The set of variants is closed on purpose: the interpreter matches on it
/// exhaustively, so adding a construct forces every consumer to handle it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "instr", rename_all = "snake_case")]
pub enum Instruction {
    BinOp {
        dest: String,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    UnOp {
        dest: String,
        op: UnaryOp,
        operand: Operand,
    },
    Convert {
        dest: String,
        operand: Operand,
        to: Type,
    },
    Phi {
        dest: String,
        edges: Vec<PhiEdge>,
    },
    Alloc {
        dest: String,
        ty: Type,
    },
    Store {
        addr: Operand,
        value: Operand,
    },
    Load {
        dest: String,
        addr: Operand,
    },
    FieldAddr {
        dest: String,
        base: Operand,
        field: usize,
    },
    MakeArray {
        dest: String,
        elem: Type,
        len: Operand,
    },
    IndexAddr {
        dest: String,
        array: Operand,
        index: Operand,
    },
    Len {
        dest: String,
        array: Operand,
    },
    Call {
        dest: Option<String>,
        callee: String,
        args: Vec<Operand>,
        #[serde(default)]
        ret: Option<Type>,
    },
    Jump {
        target: usize,
    },
    If {
        cond: Operand,
        then_block: usize,
        else_block: usize,
    },
    Return {
        #[serde(default)]
        value: Option<Operand>,
    },
    Unsupported {
        what: String,
    },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. } | Instruction::If { .. } | Instruction::Return { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instruction::BinOp { .. } => "bin_op",
            Instruction::UnOp { .. } => "un_op",
            Instruction::Convert { .. } => "convert",
            Instruction::Phi { .. } => "phi",
            Instruction::Alloc { .. } => "alloc",
            Instruction::Store { .. } => "store",
            Instruction::Load { .. } => "load",
            Instruction::FieldAddr { .. } => "field_addr",
            Instruction::MakeArray { .. } => "make_array",
            Instruction::IndexAddr { .. } => "index_addr",
            Instruction::Len { .. } => "len",
            Instruction::Call { .. } => "call",
            Instruction::Jump { .. } => "jump",
            Instruction::If { .. } => "if",
            Instruction::Return { .. } => "return",
            Instruction::Unsupported { .. } => "unsupported",
        }
    }

    /// Successor blocks named by a terminator, in branch order.
    pub fn targets(&self) -> Vec<usize> {
        match self {
            Instruction::Jump { target } => vec![*target],
            Instruction::If {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }

    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Instruction::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::UnOp { operand, .. } | Instruction::Convert { operand, .. } => {
                vec![operand]
            }
            Instruction::Phi { edges, .. } => edges.iter().map(|e| &e.value).collect(),
            Instruction::Store { addr, value } => vec![addr, value],
            Instruction::Load { addr, .. } => vec![addr],
            Instruction::FieldAddr { base, .. } => vec![base],
            Instruction::MakeArray { len, .. } => vec![len],
            Instruction::IndexAddr { array, index, .. } => vec![array, index],
            Instruction::Len { array, .. } => vec![array],
            Instruction::Call { args, .. } => args.iter().collect(),
            Instruction::If { cond, .. } => vec![cond],
            Instruction::Return { value } => value.iter().collect(),
            Instruction::Alloc { .. } | Instruction::Jump { .. } | Instruction::Unsupported { .. } => {
                Vec::new()
            }
        }
    }

    /// Types written out in the instruction itself.
    pub fn types(&self) -> Vec<&Type> {
        match self {
            Instruction::Convert { to, .. } => vec![to],
            Instruction::Alloc { ty, .. } => vec![ty],
            Instruction::MakeArray { elem, .. } => vec![elem],
            Instruction::Call { ret, .. } => ret.iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BasicBlock {
    pub index: usize,
    pub instrs: Vec<Instruction>,
}

impl BasicBlock {
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instrs.last().filter(|i| i.is_terminator())
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<Type>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn block(&self, index: usize) -> Option<&BasicBlock> {
        self.blocks.get(index)
    }

    pub fn instruction(&self, block: usize, instr: usize) -> Option<&Instruction> {
        self.blocks.get(block).and_then(|b| b.instrs.get(instr))
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Type>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub structs: Vec<StructDecl>,
    pub functions: Vec<Function>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn structure(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name.clone()).collect()
    }

    /// Field tables keyed by struct name, in declaration order.
    pub fn struct_table(&self) -> FxHashMap<String, Vec<Type>> {
        self.structs
            .iter()
            .map(|s| (s.name.clone(), s.fields.clone()))
            .collect()
    }
}

/// A position inside a function: block index and instruction index.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    pub function: String,
    pub block: usize,
    pub instr: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:b{}:i{}", self.function, self.block, self.instr)
    }
}
