//! Stack/local values (spec.md §4.7, §6 type signatures).

use std::fmt;

use super::heap::InstanceId;

/// A tagged value that can live on the operand stack or in a local slot.
/// Arithmetic and comparison instructions dispatch on this tag at
/// execution time rather than at parse time, since the stack is already
/// dynamically typed by construction (spec.md §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Bool(bool),
    Reference(Option<InstanceId>),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Reference(_) => "reference",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Reference(Some(id)) => write!(f, "ref({})", id.0),
            Value::Reference(None) => write!(f, "null"),
            Value::Null => write!(f, "null"),
        }
    }
}
