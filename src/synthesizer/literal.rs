use std::fmt;

use serde::{Deserialize, Serialize};
use z3::Model;

use crate::executor::error::SymbolicResult;
use crate::executor::symbolic_memory::{Address, Pointer, SymbolicMemory};
use crate::executor::symbolic_value::{concrete_from_model, SymbolicValue};
use crate::program::Type;

/// Arrays longer than this are cut when rendered.
pub const MAX_RENDERED_ELEMENTS: usize = 64;

/// A concrete input or output value of a synthesized test.
///
/// # Examples
/// ```
/// use pathsynth::synthesizer::literal::Literal;
///
/// let point = Literal::Struct {
///     name: "Point".to_string(),
///     fields: vec![Literal::int(1, 64), Literal::int(-2, 64)],
/// };
/// assert_eq!(point.to_string(), "Point{1, -2}");
/// assert_eq!(Literal::Pointer(Box::new(Literal::Bool(true))).to_string(), "&true");
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Int { value: i64, width: u32 },
    Float { value: f64, width: u32 },
    Bool(bool),
    Nil,
    Pointer(Box<Literal>),
    Struct { name: String, fields: Vec<Literal> },
    Array(Vec<Literal>),
    /// A reference that was not followed because the depth limit was hit.
    Address(i64),
    /// The model did not fix this value; any value works.
    Any,
}

impl Literal {
    pub fn int(value: i64, width: u32) -> Self {
        Literal::Int { value, width }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Float { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int { value, .. } => write!(f, "{}", value),
            Literal::Float { value, .. } => write!(f, "{}", value),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => write!(f, "nil"),
            Literal::Pointer(inner) => write!(f, "&{}", inner),
            Literal::Struct { name, fields } => {
                let fields: Vec<String> = fields.iter().map(|l| l.to_string()).collect();
                write!(f, "{}{{{}}}", name, fields.join(", "))
            }
            Literal::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|l| l.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Literal::Address(a) => write!(f, "@{}", a),
            Literal::Any => write!(f, "_"),
        }
    }
}

/// Evaluates `value` under `model`, folding the result to a concrete value.
pub fn evaluate<'ctx>(model: &Model<'ctx>, value: &SymbolicValue<'ctx>) -> Option<SymbolicValue<'ctx>> {
    let evaluated = match value {
        SymbolicValue::SymbolicInt(bv, w) => SymbolicValue::SymbolicInt(model.eval(bv, true)?, *w),
        SymbolicValue::SymbolicFloat(r, w) => {
            SymbolicValue::SymbolicFloat(model.eval(r, true)?, *w)
        }
        SymbolicValue::SymbolicBool(b) => SymbolicValue::SymbolicBool(model.eval(b, true)?),
        SymbolicValue::Pointer(p) => match &p.address {
            Address::Symbolic(int) => SymbolicValue::Pointer(Pointer {
                address: Address::from_int(model.eval(int, true)?),
                ..p.clone()
            }),
            Address::Concrete(_) => value.clone(),
        },
        other => other.clone(),
    };
    concrete_from_model(&evaluated)
}

/// Reads values out of a memory snapshot under a model, following
/// references at most `max_depth` levels deep.
pub struct LiteralReader<'m, 'ctx> {
    model: &'m Model<'ctx>,
    memory: SymbolicMemory<'ctx>,
    max_depth: usize,
}

impl<'m, 'ctx> LiteralReader<'m, 'ctx> {
    pub fn new(model: &'m Model<'ctx>, memory: SymbolicMemory<'ctx>, max_depth: usize) -> Self {
        LiteralReader {
            model,
            memory,
            max_depth,
        }
    }

    pub fn read(&mut self, value: &SymbolicValue<'ctx>, ty: &Type) -> SymbolicResult<Literal> {
        self.read_at(value, ty, self.max_depth)
    }

    fn read_at(&mut self, value: &SymbolicValue<'ctx>, ty: &Type, depth: usize) -> SymbolicResult<Literal> {
        let value = match evaluate(self.model, value) {
            Some(v) => v,
            None => return Ok(Literal::Any),
        };
        match value {
            SymbolicValue::ConstantInt(v, w) => Ok(Literal::Int { value: v, width: w }),
            SymbolicValue::ConstantFloat(v, w) => Ok(Literal::Float { value: v, width: w }),
            SymbolicValue::ConstantBool(b) => Ok(Literal::Bool(b)),
            SymbolicValue::Pointer(ptr) => self.read_reference(&ptr, ty, depth),
            _ => Ok(Literal::Any),
        }
    }

    fn read_reference(&mut self, ptr: &Pointer<'ctx>, ty: &Type, depth: usize) -> SymbolicResult<Literal> {
        let address = match ptr.address.as_concrete() {
            Some(0) => return Ok(Literal::Nil),
            Some(a) => a,
            None => return Ok(Literal::Any),
        };
        if depth == 0 {
            return Ok(Literal::Address(address));
        }

        match ty {
            Type::Struct { name } => {
                let fields = self.memory.struct_fields(name)?.to_vec();
                let mut literals = Vec::with_capacity(fields.len());
                for (index, field_ty) in fields.iter().enumerate() {
                    let field = self.memory.load_field(ptr, index)?;
                    literals.push(self.read_at(&field, field_ty, depth - 1)?);
                }
                Ok(Literal::Struct {
                    name: name.clone(),
                    fields: literals,
                })
            }
            Type::Array { elem } => {
                let length = self.memory.length(ptr)?;
                let length = evaluate(self.model, &length)
                    .and_then(|l| l.as_concrete_int())
                    .unwrap_or(0)
                    .clamp(0, MAX_RENDERED_ELEMENTS as i64);
                let mut elements = Vec::with_capacity(length as usize);
                for index in 0..length {
                    let slot = self
                        .memory
                        .element_pointer(ptr, &SymbolicValue::int(index, 64))?;
                    let element = self.memory.load(&slot)?;
                    elements.push(self.read_at(&element, elem, depth - 1)?);
                }
                Ok(Literal::Array(elements))
            }
            Type::Pointer { elem } => match elem.as_ref() {
                Type::Struct { .. } | Type::Array { .. } => Ok(Literal::Pointer(Box::new(
                    self.read_reference(ptr, elem, depth)?,
                ))),
                _ => {
                    let pointee = self.memory.load(ptr)?;
                    Ok(Literal::Pointer(Box::new(self.read_at(
                        &pointee,
                        elem,
                        depth - 1,
                    )?)))
                }
            },
            _ => Ok(Literal::Address(address)),
        }
    }
}
