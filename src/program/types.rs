use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a parameter, register or memory cell.
///
/// Structs and arrays are always handled by reference: a value of type
/// `Struct` or `Array` is a pointer to the object in symbolic memory.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Int { width: u32 },
    Float { width: u32 },
    Bool,
    Pointer { elem: Box<Type> },
    Array { elem: Box<Type> },
    Struct { name: String },
}

impl Type {
    pub fn int(width: u32) -> Self {
        Type::Int { width }
    }

    pub fn float(width: u32) -> Self {
        Type::Float { width }
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn array(elem: Type) -> Self {
        Type::Array {
            elem: Box::new(elem),
        }
    }

    pub fn structure(name: &str) -> Self {
        Type::Struct {
            name: name.to_string(),
        }
    }

    /// Returns the tag naming the memory line that stores values of this type.
    ///
    /// # Examples
    /// ```
    /// use pathsynth::program::Type;
    ///
    /// assert_eq!(Type::int(64).tag(), "int64");
    /// assert_eq!(Type::pointer(Type::structure("Node")).tag(), "*struct Node");
    /// assert_eq!(Type::array(Type::float(32)).tag(), "[]float32");
    /// ```
    pub fn tag(&self) -> String {
        match self {
            Type::Int { width } => format!("int{}", width),
            Type::Float { width } => format!("float{}", width),
            Type::Bool => "bool".to_string(),
            Type::Pointer { elem } => format!("*{}", elem.tag()),
            Type::Array { elem } => format!("[]{}", elem.tag()),
            Type::Struct { name } => format!("struct {}", name),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int { .. } | Type::Float { .. } | Type::Bool)
    }

    /// Types whose values are addresses into symbolic memory.
    pub fn is_reference(&self) -> bool {
        !self.is_primitive()
    }

    /// The type of the object a reference of this type designates.
    ///
    /// `*T` designates a `T` cell; structs and arrays designate themselves.
    pub fn referent(&self) -> Type {
        match self {
            Type::Pointer { elem } => (**elem).clone(),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
