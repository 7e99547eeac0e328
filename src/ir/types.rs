//! Core types for the constraint and solution language

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::Expr;

/// Types of program variables and expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// 64-bit signed integer with wrapping arithmetic
    Int,
    /// Boolean
    Bool,
    /// Fixed-arity tuple (the unit type is the empty tuple)
    Tuple(Vec<Type>),
}

impl Type {
    pub fn unit() -> Self {
        Type::Tuple(Vec::new())
    }

    /// Canonical inhabitant of the type, used as a witness for outputs
    /// that the constraint does not restrict
    pub fn default_value(&self) -> Expr {
        match self {
            Type::Int => Expr::IntLit(0),
            Type::Bool => Expr::BoolLit(false),
            Type::Tuple(elems) => Expr::Tuple(elems.iter().map(Type::default_value).collect()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, ty) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::str::FromStr for Type {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" | "i64" => Ok(Type::Int),
            "bool" | "boolean" => Ok(Type::Bool),
            "unit" | "()" => Ok(Type::unit()),
            _ => Err(format!(
                "Unknown type: '{}'. Valid options: int, bool, unit",
                s
            )),
        }
    }
}

/// A typed variable name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub ty: Type,
}

impl Identifier {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Type::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, Type::Bool)
    }

    /// Variable expression referring to this identifier
    pub fn var(&self) -> Expr {
        Expr::Var(self.clone())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tuple type of a list of identifiers
pub fn tuple_type(ids: &[Identifier]) -> Type {
    Type::Tuple(ids.iter().map(|id| id.ty.clone()).collect())
}
