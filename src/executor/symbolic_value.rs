use std::fmt;

use colored::Colorize;
use z3::ast::{Ast, Bool, Dynamic, Real, BV};
use z3::Context;

use crate::executor::error::{SymbolicError, SymbolicResult};
use crate::executor::symbolic_memory::{Address, Pointer};
use crate::executor::utils::{
    bv_to_i64, f64_to_ratio, real_to_f64, round_float, shift_left, shift_right, signed_div,
    signed_rem, truncate_int,
};
use crate::program::{BinaryOp, Type, UnaryOp};

/// A value flowing through the interpreter.
///
/// Concrete variants carry plain Rust scalars so that fully concrete code
/// (loop counters, constant folding) never touches the solver. Symbolic
/// variants wrap z3 terms: integers are signed bit-vectors of their
/// declared width, floats are reals whose width is only used to round
/// concrete results, booleans are z3 booleans.
#[derive(Clone, Debug)]
pub enum SymbolicValue<'ctx> {
    ConstantInt(i64, u32),
    ConstantFloat(f64, u32),
    ConstantBool(bool),
    SymbolicInt(BV<'ctx>, u32),
    SymbolicFloat(Real<'ctx>, u32),
    SymbolicBool(Bool<'ctx>),
    Pointer(Pointer<'ctx>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ValueKind {
    Int(u32),
    Float(u32),
    Bool,
    Pointer,
}

/// Both operands of a binary operation after kind and representation
/// have been unified.
enum Promoted<'ctx> {
    ConcreteInt(i64, i64, u32),
    ConcreteFloat(f64, f64, u32),
    ConcreteBool(bool, bool),
    Int(BV<'ctx>, BV<'ctx>, u32),
    Float(Real<'ctx>, Real<'ctx>, u32),
    Bool(Bool<'ctx>, Bool<'ctx>),
    Pointers(Pointer<'ctx>, Pointer<'ctx>),
}

impl<'ctx> SymbolicValue<'ctx> {
    pub fn int(value: i64, width: u32) -> Self {
        SymbolicValue::ConstantInt(truncate_int(value, width), width)
    }

    pub fn float(value: f64, width: u32) -> Self {
        SymbolicValue::ConstantFloat(round_float(value, width), width)
    }

    /// Creates an unconstrained symbolic value of a primitive type.
    pub fn fresh(ctx: &'ctx Context, name: &str, ty: &Type) -> SymbolicResult<Self> {
        match ty {
            Type::Int { width } => Ok(SymbolicValue::SymbolicInt(
                BV::new_const(ctx, name, *width),
                *width,
            )),
            Type::Float { width } => Ok(SymbolicValue::SymbolicFloat(
                Real::new_const(ctx, name),
                *width,
            )),
            Type::Bool => Ok(SymbolicValue::SymbolicBool(Bool::new_const(ctx, name))),
            _ => Err(SymbolicError::UnsupportedConstruct(format!(
                "fresh scalar of reference type {}",
                ty
            ))),
        }
    }

    /// Like [`SymbolicValue::fresh`], but the solver picks a name that can
    /// never collide with another constant.
    pub fn fresh_unique(ctx: &'ctx Context, prefix: &str, ty: &Type) -> SymbolicResult<Self> {
        match ty {
            Type::Int { width } => Ok(SymbolicValue::SymbolicInt(
                BV::fresh_const(ctx, prefix, *width),
                *width,
            )),
            Type::Float { width } => Ok(SymbolicValue::SymbolicFloat(
                Real::fresh_const(ctx, prefix),
                *width,
            )),
            Type::Bool => Ok(SymbolicValue::SymbolicBool(Bool::fresh_const(ctx, prefix))),
            _ => Err(SymbolicError::UnsupportedConstruct(format!(
                "fresh scalar of reference type {}",
                ty
            ))),
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            SymbolicValue::ConstantInt(_, w) | SymbolicValue::SymbolicInt(_, w) => ValueKind::Int(*w),
            SymbolicValue::ConstantFloat(_, w) | SymbolicValue::SymbolicFloat(_, w) => {
                ValueKind::Float(*w)
            }
            SymbolicValue::ConstantBool(_) | SymbolicValue::SymbolicBool(_) => ValueKind::Bool,
            SymbolicValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    /// Short description of the variant, used in diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            SymbolicValue::ConstantInt(_, w) => format!("int{}", w),
            SymbolicValue::ConstantFloat(_, w) => format!("float{}", w),
            SymbolicValue::ConstantBool(_) => "bool".to_string(),
            SymbolicValue::SymbolicInt(_, w) => format!("symbolic int{}", w),
            SymbolicValue::SymbolicFloat(_, w) => format!("symbolic float{}", w),
            SymbolicValue::SymbolicBool(_) => "symbolic bool".to_string(),
            SymbolicValue::Pointer(p) => format!("pointer to {}", p.sort_tag()),
        }
    }

    /// The declared type this value inhabits.
    pub fn value_type(&self) -> Type {
        match self {
            SymbolicValue::ConstantInt(_, w) | SymbolicValue::SymbolicInt(_, w) => Type::int(*w),
            SymbolicValue::ConstantFloat(_, w) | SymbolicValue::SymbolicFloat(_, w) => {
                Type::float(*w)
            }
            SymbolicValue::ConstantBool(_) | SymbolicValue::SymbolicBool(_) => Type::Bool,
            SymbolicValue::Pointer(p) => p.declared_type(),
        }
    }

    pub fn is_concrete(&self) -> bool {
        match self {
            SymbolicValue::ConstantInt(..)
            | SymbolicValue::ConstantFloat(..)
            | SymbolicValue::ConstantBool(_) => true,
            SymbolicValue::Pointer(p) => matches!(p.address, Address::Concrete(_)),
            _ => false,
        }
    }

    pub fn as_concrete_int(&self) -> Option<i64> {
        match self {
            SymbolicValue::ConstantInt(v, _) => Some(*v),
            _ => None,
        }
    }

    pub fn as_concrete_float(&self) -> Option<f64> {
        match self {
            SymbolicValue::ConstantFloat(v, _) => Some(*v),
            _ => None,
        }
    }

    pub fn as_concrete_bool(&self) -> Option<bool> {
        match self {
            SymbolicValue::ConstantBool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> SymbolicResult<&Pointer<'ctx>> {
        match self {
            SymbolicValue::Pointer(p) => Ok(p),
            other => Err(SymbolicError::type_mismatch(
                "dereference",
                &other.kind_name(),
                "pointer",
            )),
        }
    }

    /// Lowers an integer value to a bit-vector term of its own width.
    pub fn to_bv(&self, ctx: &'ctx Context) -> SymbolicResult<BV<'ctx>> {
        match self {
            SymbolicValue::ConstantInt(v, w) => Ok(BV::from_i64(ctx, *v, *w)),
            SymbolicValue::SymbolicInt(bv, _) => Ok(bv.clone()),
            other => Err(SymbolicError::type_mismatch("to_bv", &other.kind_name(), "int")),
        }
    }

    /// Lowers a float value to an exact rational term.
    pub fn to_real(&self, ctx: &'ctx Context) -> SymbolicResult<Real<'ctx>> {
        match self {
            SymbolicValue::ConstantFloat(v, _) => lower_float(ctx, *v),
            SymbolicValue::SymbolicFloat(r, _) => Ok(r.clone()),
            other => Err(SymbolicError::type_mismatch(
                "to_real",
                &other.kind_name(),
                "float",
            )),
        }
    }

    /// Lowers a boolean value to a z3 boolean, as needed for path constraints.
    pub fn to_bool(&self, ctx: &'ctx Context) -> SymbolicResult<Bool<'ctx>> {
        match self {
            SymbolicValue::ConstantBool(b) => Ok(Bool::from_bool(ctx, *b)),
            SymbolicValue::SymbolicBool(b) => Ok(b.clone()),
            other => Err(SymbolicError::type_mismatch(
                "to_bool",
                &other.kind_name(),
                "bool",
            )),
        }
    }

    /// Converts to an integer of `width` bits: sign extension or truncation
    /// for integers, truncation toward zero for floats, 0/1 for booleans.
    pub fn as_int(&self, ctx: &'ctx Context, width: u32) -> SymbolicResult<Self> {
        if width == 0 || width > 64 {
            return Err(SymbolicError::UnsupportedConstruct(format!(
                "integer width {}",
                width
            )));
        }
        match self {
            SymbolicValue::ConstantInt(v, _) => Ok(SymbolicValue::int(*v, width)),
            SymbolicValue::ConstantFloat(v, _) => {
                // saturating cast, NaN becomes 0
                Ok(SymbolicValue::int(v.trunc() as i64, width))
            }
            SymbolicValue::ConstantBool(b) => Ok(SymbolicValue::int(*b as i64, width)),
            SymbolicValue::SymbolicInt(bv, w) => Ok(SymbolicValue::SymbolicInt(
                resize_bv(bv, *w, width),
                width,
            )),
            SymbolicValue::SymbolicFloat(r, _) => {
                let zero = Real::from_real(ctx, 0, 1);
                let toward_zero = r
                    .ge(&zero)
                    .ite(&r.to_int(), &r.unary_minus().to_int().unary_minus());
                Ok(SymbolicValue::SymbolicInt(
                    BV::from_int(&toward_zero, width),
                    width,
                ))
            }
            SymbolicValue::SymbolicBool(b) => Ok(SymbolicValue::SymbolicInt(
                b.ite(&BV::from_i64(ctx, 1, width), &BV::from_i64(ctx, 0, width)),
                width,
            )),
            SymbolicValue::Pointer(_) => Err(SymbolicError::type_mismatch(
                "as_int",
                &self.kind_name(),
                &format!("int{}", width),
            )),
        }
    }

    /// Converts to a float of `width` bits.
    pub fn as_float(&self, ctx: &'ctx Context, width: u32) -> SymbolicResult<Self> {
        match self {
            SymbolicValue::ConstantInt(v, _) => Ok(SymbolicValue::float(*v as f64, width)),
            SymbolicValue::ConstantFloat(v, _) => Ok(SymbolicValue::float(*v, width)),
            SymbolicValue::ConstantBool(b) => {
                Ok(SymbolicValue::float(if *b { 1.0 } else { 0.0 }, width))
            }
            SymbolicValue::SymbolicInt(bv, _) => Ok(SymbolicValue::SymbolicFloat(
                Real::from_int(&bv.to_int(true)),
                width,
            )),
            SymbolicValue::SymbolicFloat(r, _) => Ok(SymbolicValue::SymbolicFloat(r.clone(), width)),
            SymbolicValue::SymbolicBool(b) => Ok(SymbolicValue::SymbolicFloat(
                b.ite(&Real::from_real(ctx, 1, 1), &Real::from_real(ctx, 0, 1)),
                width,
            )),
            SymbolicValue::Pointer(_) => Err(SymbolicError::type_mismatch(
                "as_float",
                &self.kind_name(),
                &format!("float{}", width),
            )),
        }
    }

    /// Converts to a boolean: numbers are true when non-zero.
    pub fn as_bool(&self, ctx: &'ctx Context) -> SymbolicResult<Self> {
        match self {
            SymbolicValue::ConstantInt(v, _) => Ok(SymbolicValue::ConstantBool(*v != 0)),
            SymbolicValue::ConstantFloat(v, _) => Ok(SymbolicValue::ConstantBool(*v != 0.0)),
            SymbolicValue::ConstantBool(_) | SymbolicValue::SymbolicBool(_) => Ok(self.clone()),
            SymbolicValue::SymbolicInt(bv, w) => Ok(SymbolicValue::SymbolicBool(
                bv._eq(&BV::from_i64(ctx, 0, *w)).not(),
            )),
            SymbolicValue::SymbolicFloat(r, _) => Ok(SymbolicValue::SymbolicBool(
                r._eq(&Real::from_real(ctx, 0, 1)).not(),
            )),
            SymbolicValue::Pointer(_) => Err(SymbolicError::type_mismatch(
                "as_bool",
                &self.kind_name(),
                "bool",
            )),
        }
    }

    /// Converts to the given primitive type.
    pub fn convert(&self, ctx: &'ctx Context, ty: &Type) -> SymbolicResult<Self> {
        match ty {
            Type::Int { width } => self.as_int(ctx, *width),
            Type::Float { width } => self.as_float(ctx, *width),
            Type::Bool => self.as_bool(ctx),
            _ => match self {
                SymbolicValue::Pointer(p) if p.declared_type() == *ty => Ok(self.clone()),
                _ => Err(SymbolicError::type_mismatch(
                    "convert",
                    &self.kind_name(),
                    &ty.tag(),
                )),
            },
        }
    }

    /// Encodes the value as a memory-line element of type `ty`.
    pub fn to_dynamic(&self, ctx: &'ctx Context, ty: &Type) -> SymbolicResult<Dynamic<'ctx>> {
        match ty {
            Type::Int { width } => Ok(Dynamic::from_ast(&self.as_int(ctx, *width)?.to_bv(ctx)?)),
            Type::Float { width } => Ok(Dynamic::from_ast(
                &self.as_float(ctx, *width)?.to_real(ctx)?,
            )),
            Type::Bool => Ok(Dynamic::from_ast(&self.to_bool(ctx)?)),
            _ => match self {
                SymbolicValue::Pointer(p) => Ok(Dynamic::from_ast(&p.address.to_int(ctx))),
                other => Err(SymbolicError::type_mismatch(
                    "store",
                    &other.kind_name(),
                    &ty.tag(),
                )),
            },
        }
    }

    /// Decodes a memory-line element of type `ty`, folding numerals back
    /// into concrete values.
    pub fn from_dynamic(ast: &Dynamic<'ctx>, ty: &Type) -> SymbolicResult<Self> {
        let ast = ast.simplify();
        let mismatch = || SymbolicError::type_mismatch("load", &ty.tag(), &format!("{}", ast));
        match ty {
            Type::Int { width } => {
                let bv = ast.as_bv().ok_or_else(mismatch)?;
                Ok(match bv_to_i64(&bv) {
                    Some(v) => SymbolicValue::int(v, *width),
                    None => SymbolicValue::SymbolicInt(bv, *width),
                })
            }
            Type::Float { width } => {
                let real = ast.as_real().ok_or_else(mismatch)?;
                Ok(match real.as_real() {
                    Some((n, d)) if d != 0 => SymbolicValue::float(n as f64 / d as f64, *width),
                    _ => SymbolicValue::SymbolicFloat(real, *width),
                })
            }
            Type::Bool => {
                let b = ast.as_bool().ok_or_else(mismatch)?;
                Ok(match b.as_bool() {
                    Some(v) => SymbolicValue::ConstantBool(v),
                    None => SymbolicValue::SymbolicBool(b),
                })
            }
            _ => {
                let int = ast.as_int().ok_or_else(mismatch)?;
                Ok(SymbolicValue::Pointer(Pointer::new(
                    Address::from_int(int),
                    ty.referent(),
                )))
            }
        }
    }

    pub fn lookup_fmt(&self) -> String {
        match self {
            SymbolicValue::ConstantInt(v, w) => format!("{}{}", v, format!(":i{}", w).dimmed()),
            SymbolicValue::ConstantFloat(v, w) => format!("{}{}", v, format!(":f{}", w).dimmed()),
            SymbolicValue::ConstantBool(b) => {
                if *b {
                    "✅ true".to_string()
                } else {
                    "❌ false".to_string()
                }
            }
            SymbolicValue::SymbolicInt(bv, _) => format!("{}", bv).bright_green().to_string(),
            SymbolicValue::SymbolicFloat(r, _) => format!("{}", r).bright_green().to_string(),
            SymbolicValue::SymbolicBool(b) => format!("{}", b).bright_green().to_string(),
            SymbolicValue::Pointer(p) => p.lookup_fmt(),
        }
    }
}

impl fmt::Display for SymbolicValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolicValue::ConstantInt(v, w) => write!(f, "{}:int{}", v, w),
            SymbolicValue::ConstantFloat(v, w) => write!(f, "{}:float{}", v, w),
            SymbolicValue::ConstantBool(b) => write!(f, "{}", b),
            SymbolicValue::SymbolicInt(bv, _) => write!(f, "{}", bv),
            SymbolicValue::SymbolicFloat(r, _) => write!(f, "{}", r),
            SymbolicValue::SymbolicBool(b) => write!(f, "{}", b),
            SymbolicValue::Pointer(p) => write!(f, "{}", p),
        }
    }
}

fn lower_float<'ctx>(ctx: &'ctx Context, value: f64) -> SymbolicResult<Real<'ctx>> {
    let (num, den) = f64_to_ratio(value).ok_or_else(|| {
        SymbolicError::UnsupportedConstruct(format!("non-finite float {}", value))
    })?;
    Real::from_real_str(ctx, &num.to_string(), &den.to_string()).ok_or_else(|| {
        SymbolicError::UnsupportedConstruct(format!("float literal {} has no rational form", value))
    })
}

fn resize_bv<'ctx>(bv: &BV<'ctx>, from: u32, to: u32) -> BV<'ctx> {
    if to > from {
        bv.sign_ext(to - from)
    } else if to < from {
        bv.extract(to - 1, 0)
    } else {
        bv.clone()
    }
}

/// Reads a model-evaluated term back as a concrete value.
pub fn concrete_from_model<'ctx>(value: &SymbolicValue<'ctx>) -> Option<SymbolicValue<'ctx>> {
    match value {
        SymbolicValue::SymbolicInt(bv, w) => bv_to_i64(bv).map(|v| SymbolicValue::int(v, *w)),
        SymbolicValue::SymbolicFloat(r, w) => real_to_f64(r).map(|v| SymbolicValue::float(v, *w)),
        SymbolicValue::SymbolicBool(b) => b.simplify().as_bool().map(SymbolicValue::ConstantBool),
        SymbolicValue::Pointer(p) => p
            .address
            .as_concrete()
            .map(|a| SymbolicValue::Pointer(Pointer::new(Address::Concrete(a), p.pointee.clone()))),
        other => Some(other.clone()),
    }
}

/// The single promotion routine every binary operation goes through.
///
/// Kinds are unified first: integers of different widths are sign-extended
/// to the wider one and an integer meeting a float becomes a float of the
/// wider width. Representation is unified second: a concrete operand is
/// lowered to a solver term only when the other operand is symbolic.
fn promote<'ctx>(
    ctx: &'ctx Context,
    op: BinaryOp,
    lhs: &SymbolicValue<'ctx>,
    rhs: &SymbolicValue<'ctx>,
) -> SymbolicResult<Promoted<'ctx>> {
    let mismatch = || SymbolicError::type_mismatch(&format!("{:?}", op), &lhs.kind_name(), &rhs.kind_name());

    let target = match (lhs.kind(), rhs.kind()) {
        (ValueKind::Int(a), ValueKind::Int(b)) => ValueKind::Int(a.max(b)),
        (ValueKind::Float(a), ValueKind::Float(b))
        | (ValueKind::Int(a), ValueKind::Float(b))
        | (ValueKind::Float(a), ValueKind::Int(b)) => ValueKind::Float(a.max(b)),
        (ValueKind::Bool, ValueKind::Bool) => ValueKind::Bool,
        (ValueKind::Pointer, ValueKind::Pointer) => ValueKind::Pointer,
        _ => return Err(mismatch()),
    };

    match target {
        ValueKind::Int(w) => {
            let (l, r) = (lhs.as_int(ctx, w)?, rhs.as_int(ctx, w)?);
            match (&l, &r) {
                (SymbolicValue::ConstantInt(a, _), SymbolicValue::ConstantInt(b, _)) => {
                    Ok(Promoted::ConcreteInt(*a, *b, w))
                }
                _ => Ok(Promoted::Int(l.to_bv(ctx)?, r.to_bv(ctx)?, w)),
            }
        }
        ValueKind::Float(w) => {
            let (l, r) = (lhs.as_float(ctx, w)?, rhs.as_float(ctx, w)?);
            match (&l, &r) {
                (SymbolicValue::ConstantFloat(a, _), SymbolicValue::ConstantFloat(b, _)) => {
                    Ok(Promoted::ConcreteFloat(*a, *b, w))
                }
                _ => Ok(Promoted::Float(l.to_real(ctx)?, r.to_real(ctx)?, w)),
            }
        }
        ValueKind::Bool => match (lhs, rhs) {
            (SymbolicValue::ConstantBool(a), SymbolicValue::ConstantBool(b)) => {
                Ok(Promoted::ConcreteBool(*a, *b))
            }
            _ => Ok(Promoted::Bool(lhs.to_bool(ctx)?, rhs.to_bool(ctx)?)),
        },
        ValueKind::Pointer => match (lhs, rhs) {
            (SymbolicValue::Pointer(a), SymbolicValue::Pointer(b)) => {
                Ok(Promoted::Pointers(a.clone(), b.clone()))
            }
            _ => Err(mismatch()),
        },
    }
}

/// Evaluates `lhs op rhs`.
///
/// # Examples
/// ```
/// use pathsynth::executor::symbolic_value::{evaluate_binary_op, SymbolicValue};
/// use pathsynth::program::BinaryOp;
/// use z3::{Config, Context};
///
/// let ctx = Context::new(&Config::new());
/// let sum = evaluate_binary_op(
///     &ctx,
///     BinaryOp::Add,
///     &SymbolicValue::int(2, 64),
///     &SymbolicValue::float(0.5, 64),
/// )
/// .unwrap();
/// assert_eq!(sum.as_concrete_float(), Some(2.5));
/// ```
pub fn evaluate_binary_op<'ctx>(
    ctx: &'ctx Context,
    op: BinaryOp,
    lhs: &SymbolicValue<'ctx>,
    rhs: &SymbolicValue<'ctx>,
) -> SymbolicResult<SymbolicValue<'ctx>> {
    let promoted = promote(ctx, op, lhs, rhs)?;
    let mismatch = || SymbolicError::type_mismatch(&format!("{:?}", op), &lhs.kind_name(), &rhs.kind_name());

    if op.is_logical() {
        return match promoted {
            Promoted::ConcreteBool(a, b) => Ok(SymbolicValue::ConstantBool(match op {
                BinaryOp::BoolAnd => a && b,
                BinaryOp::BoolOr => a || b,
                _ => a ^ b,
            })),
            Promoted::Bool(a, b) => Ok(SymbolicValue::SymbolicBool(match op {
                BinaryOp::BoolAnd => Bool::and(ctx, &[&a, &b]),
                BinaryOp::BoolOr => Bool::or(ctx, &[&a, &b]),
                _ => a.xor(&b),
            })),
            _ => Err(mismatch()),
        };
    }

    if op.is_comparison() {
        return match promoted {
            Promoted::ConcreteInt(a, b, _) => Ok(SymbolicValue::ConstantBool(compare(op, &a, &b))),
            Promoted::ConcreteFloat(a, b, _) => Ok(SymbolicValue::ConstantBool(compare(op, &a, &b))),
            Promoted::ConcreteBool(a, b) => match op {
                BinaryOp::Eq => Ok(SymbolicValue::ConstantBool(a == b)),
                BinaryOp::NotEq => Ok(SymbolicValue::ConstantBool(a != b)),
                _ => Err(mismatch()),
            },
            Promoted::Int(a, b, _) => Ok(SymbolicValue::SymbolicBool(match op {
                BinaryOp::Gt => a.bvsgt(&b),
                BinaryOp::Ge => a.bvsge(&b),
                BinaryOp::Lt => a.bvslt(&b),
                BinaryOp::Le => a.bvsle(&b),
                BinaryOp::Eq => a._eq(&b),
                _ => a._eq(&b).not(),
            })),
            Promoted::Float(a, b, _) => Ok(SymbolicValue::SymbolicBool(match op {
                BinaryOp::Gt => a.gt(&b),
                BinaryOp::Ge => a.ge(&b),
                BinaryOp::Lt => a.lt(&b),
                BinaryOp::Le => a.le(&b),
                BinaryOp::Eq => a._eq(&b),
                _ => a._eq(&b).not(),
            })),
            Promoted::Bool(a, b) => match op {
                BinaryOp::Eq => Ok(SymbolicValue::SymbolicBool(a._eq(&b))),
                BinaryOp::NotEq => Ok(SymbolicValue::SymbolicBool(a._eq(&b).not())),
                _ => Err(mismatch()),
            },
            Promoted::Pointers(a, b) => {
                let equal = a.equals(ctx, &b);
                match op {
                    BinaryOp::Eq => Ok(equal),
                    BinaryOp::NotEq => SymbolicValue::not(&equal, ctx),
                    _ => Err(mismatch()),
                }
            }
        };
    }

    match promoted {
        Promoted::ConcreteInt(a, b, w) => {
            let v = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div => signed_div(a, b, w),
                BinaryOp::Rem => signed_rem(a, b, w),
                BinaryOp::Shl => shift_left(a, b, w),
                BinaryOp::Shr => shift_right(a, b, w),
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                _ => return Err(mismatch()),
            };
            Ok(SymbolicValue::int(v, w))
        }
        Promoted::ConcreteFloat(a, b, w) => {
            let v = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => return Err(mismatch()),
            };
            Ok(SymbolicValue::float(v, w))
        }
        Promoted::Int(a, b, w) => {
            let bv = match op {
                BinaryOp::Add => a.bvadd(&b),
                BinaryOp::Sub => a.bvsub(&b),
                BinaryOp::Mul => a.bvmul(&b),
                BinaryOp::Div => a.bvsdiv(&b),
                BinaryOp::Rem => a.bvsrem(&b),
                BinaryOp::Shl => a.bvshl(&b),
                BinaryOp::Shr => a.bvashr(&b),
                BinaryOp::BitAnd => a.bvand(&b),
                BinaryOp::BitOr => a.bvor(&b),
                BinaryOp::BitXor => a.bvxor(&b),
                _ => return Err(mismatch()),
            };
            Ok(SymbolicValue::SymbolicInt(bv, w))
        }
        Promoted::Float(a, b, w) => {
            let real = match op {
                BinaryOp::Add => Real::add(ctx, &[&a, &b]),
                BinaryOp::Sub => Real::sub(ctx, &[&a, &b]),
                BinaryOp::Mul => Real::mul(ctx, &[&a, &b]),
                BinaryOp::Div => a.div(&b),
                _ => return Err(mismatch()),
            };
            Ok(SymbolicValue::SymbolicFloat(real, w))
        }
        Promoted::ConcreteBool(..) | Promoted::Bool(..) | Promoted::Pointers(..) => Err(mismatch()),
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Eq => a == b,
        _ => a != b,
    }
}

/// Evaluates a unary operator.
pub fn evaluate_unary_op<'ctx>(
    _ctx: &'ctx Context,
    op: UnaryOp,
    operand: &SymbolicValue<'ctx>,
) -> SymbolicResult<SymbolicValue<'ctx>> {
    match (op, operand) {
        (UnaryOp::Neg, SymbolicValue::ConstantInt(v, w)) => Ok(SymbolicValue::int(v.wrapping_neg(), *w)),
        (UnaryOp::Neg, SymbolicValue::ConstantFloat(v, w)) => Ok(SymbolicValue::float(-v, *w)),
        (UnaryOp::Neg, SymbolicValue::SymbolicInt(bv, w)) => {
            Ok(SymbolicValue::SymbolicInt(bv.bvneg(), *w))
        }
        (UnaryOp::Neg, SymbolicValue::SymbolicFloat(r, w)) => {
            Ok(SymbolicValue::SymbolicFloat(r.unary_minus(), *w))
        }
        (UnaryOp::Not, SymbolicValue::ConstantBool(b)) => Ok(SymbolicValue::ConstantBool(!b)),
        (UnaryOp::Not, SymbolicValue::SymbolicBool(b)) => Ok(SymbolicValue::SymbolicBool(b.not())),
        (UnaryOp::BitNot, SymbolicValue::ConstantInt(v, w)) => Ok(SymbolicValue::int(!v, *w)),
        (UnaryOp::BitNot, SymbolicValue::SymbolicInt(bv, w)) => {
            Ok(SymbolicValue::SymbolicInt(bv.bvnot(), *w))
        }
        _ => Err(SymbolicError::type_mismatch(
            &format!("{:?}", op),
            &operand.kind_name(),
            "-",
        )),
    }
}

macro_rules! binary_methods {
    ($($name:ident => $op:expr),* $(,)?) => {
        impl<'ctx> SymbolicValue<'ctx> {
            $(
                pub fn $name(
                    &self,
                    ctx: &'ctx Context,
                    other: &SymbolicValue<'ctx>,
                ) -> SymbolicResult<SymbolicValue<'ctx>> {
                    evaluate_binary_op(ctx, $op, self, other)
                }
            )*
        }
    };
}

binary_methods! {
    add => BinaryOp::Add,
    sub => BinaryOp::Sub,
    mul => BinaryOp::Mul,
    div => BinaryOp::Div,
    rem => BinaryOp::Rem,
    shl => BinaryOp::Shl,
    shr => BinaryOp::Shr,
    bitwise_and => BinaryOp::BitAnd,
    bitwise_or => BinaryOp::BitOr,
    bitwise_xor => BinaryOp::BitXor,
    gt => BinaryOp::Gt,
    ge => BinaryOp::Ge,
    lt => BinaryOp::Lt,
    le => BinaryOp::Le,
    eq => BinaryOp::Eq,
    not_eq => BinaryOp::NotEq,
    bool_and => BinaryOp::BoolAnd,
    bool_or => BinaryOp::BoolOr,
    bool_xor => BinaryOp::BoolXor,
}

impl<'ctx> SymbolicValue<'ctx> {
    pub fn not(&self, ctx: &'ctx Context) -> SymbolicResult<SymbolicValue<'ctx>> {
        evaluate_unary_op(ctx, UnaryOp::Not, self)
    }

    pub fn neg(&self, ctx: &'ctx Context) -> SymbolicResult<SymbolicValue<'ctx>> {
        evaluate_unary_op(ctx, UnaryOp::Neg, self)
    }

    pub fn bitwise_not(&self, ctx: &'ctx Context) -> SymbolicResult<SymbolicValue<'ctx>> {
        evaluate_unary_op(ctx, UnaryOp::BitNot, self)
    }
}
