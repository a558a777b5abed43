//! Scalar values and typed column vectors.

pub mod datum;
pub mod vec;

pub use datum::Datum;
pub use vec::ColumnVec;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{CurlewError, Result};

/// Element type tag for a value or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// The type of an all-null column; castable to any other type.
    Null,
    Bool,
    Int64,
    Float64,
    Utf8,
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int64 | ValueType::Float64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Null => write!(f, "null"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int64 => write!(f, "int64"),
            ValueType::Float64 => write!(f, "float64"),
            ValueType::Utf8 => write!(f, "utf8"),
        }
    }
}

/// A single scalar value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int64(_) => ValueType::Int64,
            Value::Float64(_) => ValueType::Float64,
            Value::Utf8(_) => ValueType::Utf8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, widening ints to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Repeat self into a column of length `n`.
    pub fn repeat(&self, n: usize) -> ColumnVec {
        let mut col = ColumnVec::with_capacity(self.value_type(), n);
        for _ in 0..n {
            // Pushing a value of the column's own type never fails.
            col.push_value(self.clone()).expect("type matches column");
        }
        col
    }

    /// Total ordering across all values, usable for sorted group output.
    ///
    /// Nulls sort first, then values ordered by type tag, then by value.
    /// Floats use IEEE total ordering so NaN has a stable position.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn type_rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int64(_) => 2,
                Value::Float64(_) => 2,
                Value::Utf8(_) => 3,
            }
        }
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Int64(a), Value::Float64(b)) => (*a as f64).total_cmp(b),
            (Value::Float64(a), Value::Int64(b)) => a.total_cmp(&(*b as f64)),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (a, b) => type_rank(a).cmp(&type_rank(b)),
        }
    }

    /// Render for key display and template interpolation. Unlike `Display`,
    /// strings are unquoted.
    pub fn render(&self) -> String {
        match self {
            Value::Utf8(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Interpret self as a column name.
    pub fn try_into_column_name(self) -> Result<String> {
        match self {
            Value::Utf8(s) => Ok(s),
            other => Err(CurlewError::compute(format!(
                "expected a string column name, got {} value",
                other.value_type()
            ))),
        }
    }
}

/// Bit-level equality: NaN equals NaN, so float values can act as group keys.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(v) => {
                state.write_u8(1);
                v.hash(state);
            }
            Value::Int64(v) => {
                state.write_u8(2);
                v.hash(state);
            }
            Value::Float64(v) => {
                state.write_u8(3);
                v.to_bits().hash(state);
            }
            Value::Utf8(v) => {
                state.write_u8(4);
                v.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(v) => write!(f, "\"{v}\""),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_keys_are_equal() {
        let a = Value::Float64(f64::NAN);
        let b = Value::Float64(f64::NAN);
        assert_eq!(a, b);
    }

    #[test]
    fn total_cmp_mixes_int_and_float() {
        assert_eq!(
            Value::Int64(2).total_cmp(&Value::Float64(2.5)),
            Ordering::Less
        );
        assert_eq!(
            Value::Float64(3.0).total_cmp(&Value::Int64(3)),
            Ordering::Equal
        );
    }

    #[test]
    fn nulls_sort_first() {
        assert_eq!(Value::Null.total_cmp(&Value::Int64(i64::MIN)), Ordering::Less);
    }
}
