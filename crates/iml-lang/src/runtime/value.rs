use std::fmt;

use crate::imaging::Image;
use crate::syntax::ast::TypeId;

/// A runtime value. Owns its payload; `clone` deep-copies strings and images.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Image(Image),
    None,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_)   => "int",
            Value::Float(_) => "float",
            Value::Str(_)   => "string",
            Value::Image(_) => "image",
            Value::None     => "none",
        }
    }

    /// Int or float as an int; floats truncate toward zero.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v)   => Some(*v),
            Value::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Int or float as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v)   => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Value::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Converts to the declared type `ty`. Ints and floats convert into each
    /// other, strings and images must already match, `Unknown` takes anything.
    /// On mismatch the value is handed back unchanged.
    pub fn coerce(self, ty: TypeId) -> Result<Value, Value> {
        match (ty, self) {
            (TypeId::Int, Value::Float(v))   => Ok(Value::Int(v as i64)),
            (TypeId::Float, Value::Int(v))   => Ok(Value::Float(v as f64)),
            (TypeId::Int, v @ Value::Int(_))
            | (TypeId::Float, v @ Value::Float(_))
            | (TypeId::String, v @ Value::Str(_))
            | (TypeId::Image, v @ Value::Image(_))
            | (TypeId::Unknown, v) => Ok(v),
            (_, v) => Err(v),
        }
    }
}

impl TypeId {
    /// Whether a builtin parameter of this type takes `v`, allowing int/float coercion.
    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            TypeId::Int | TypeId::Float => matches!(v, Value::Int(_) | Value::Float(_)),
            TypeId::String  => matches!(v, Value::Str(_)),
            TypeId::Image   => matches!(v, Value::Image(_)),
            TypeId::Unknown => true,
        }
    }
}

/// The text `print` writes for a value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v)     => write!(f, "{v}"),
            Value::Float(v)   => write!(f, "{v:?}"),
            Value::Str(s)     => f.write_str(s),
            Value::Image(img) => write!(f, "<Image {}x{}>", img.width(), img.height()),
            Value::None       => f.write_str("none"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
