//! Typed, null-aware column vectors.

use serde::{Deserialize, Serialize};

use super::{Value, ValueType};
use crate::errors::{CurlewError, Result};

/// A column of values, one variant per element type.
///
/// The `Null` variant represents an all-null column of unknown element type,
/// e.g. the result of a constant `null` expression. It promotes to any other
/// type when appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnVec {
    Null(usize),
    Bool(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl ColumnVec {
    pub fn with_capacity(ty: ValueType, cap: usize) -> ColumnVec {
        match ty {
            ValueType::Null => ColumnVec::Null(0),
            ValueType::Bool => ColumnVec::Bool(Vec::with_capacity(cap)),
            ValueType::Int64 => ColumnVec::Int64(Vec::with_capacity(cap)),
            ValueType::Float64 => ColumnVec::Float64(Vec::with_capacity(cap)),
            ValueType::Utf8 => ColumnVec::Utf8(Vec::with_capacity(cap)),
        }
    }

    pub fn bools(vals: &[bool]) -> ColumnVec {
        ColumnVec::Bool(vals.iter().copied().map(Some).collect())
    }

    pub fn int64s(vals: &[i64]) -> ColumnVec {
        ColumnVec::Int64(vals.iter().copied().map(Some).collect())
    }

    pub fn float64s(vals: &[f64]) -> ColumnVec {
        ColumnVec::Float64(vals.iter().copied().map(Some).collect())
    }

    pub fn utf8s(vals: &[&str]) -> ColumnVec {
        ColumnVec::Utf8(vals.iter().map(|s| Some(s.to_string())).collect())
    }

    /// Build a column from scalar values, inferring the element type.
    ///
    /// Ints are widened to floats when both appear. An all-null input yields
    /// a `Null` column.
    pub fn from_values(vals: impl IntoIterator<Item = Value>) -> Result<ColumnVec> {
        let vals: Vec<Value> = vals.into_iter().collect();

        let mut ty = ValueType::Null;
        for v in &vals {
            ty = match (ty, v.value_type()) {
                (t, ValueType::Null) => t,
                (ValueType::Null, t) => t,
                (ValueType::Int64, ValueType::Float64) => ValueType::Float64,
                (ValueType::Float64, ValueType::Int64) => ValueType::Float64,
                (a, b) if a == b => a,
                (a, b) => {
                    return Err(CurlewError::compute(format!(
                        "mixed element types in column: {a} and {b}"
                    )))
                }
            };
        }

        let mut col = ColumnVec::with_capacity(ty, vals.len());
        for v in vals {
            col.push_value(v)?;
        }
        Ok(col)
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnVec::Null(n) => *n,
            ColumnVec::Bool(v) => v.len(),
            ColumnVec::Int64(v) => v.len(),
            ColumnVec::Float64(v) => v.len(),
            ColumnVec::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ColumnVec::Null(_) => ValueType::Null,
            ColumnVec::Bool(_) => ValueType::Bool,
            ColumnVec::Int64(_) => ValueType::Int64,
            ColumnVec::Float64(_) => ValueType::Float64,
            ColumnVec::Utf8(_) => ValueType::Utf8,
        }
    }

    /// Get the value at `idx`, null included. Out of bounds returns `None`.
    pub fn value(&self, idx: usize) -> Option<Value> {
        if idx >= self.len() {
            return None;
        }
        Some(match self {
            ColumnVec::Null(_) => Value::Null,
            ColumnVec::Bool(v) => v[idx].map(Value::Bool).unwrap_or(Value::Null),
            ColumnVec::Int64(v) => v[idx].map(Value::Int64).unwrap_or(Value::Null),
            ColumnVec::Float64(v) => v[idx].map(Value::Float64).unwrap_or(Value::Null),
            ColumnVec::Utf8(v) => v[idx]
                .as_ref()
                .map(|s| Value::Utf8(s.clone()))
                .unwrap_or(Value::Null),
        })
    }

    pub fn first_value(&self) -> Option<Value> {
        self.value(0)
    }

    pub fn iter_values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(|i| self.value(i).expect("index in bounds"))
    }

    /// Push a scalar onto this column. A null pushes into any variant; a
    /// typed value must match the column's element type.
    pub fn push_value(&mut self, val: Value) -> Result<()> {
        match (&mut *self, val) {
            (ColumnVec::Null(n), Value::Null) => *n += 1,
            (ColumnVec::Bool(v), Value::Bool(b)) => v.push(Some(b)),
            (ColumnVec::Bool(v), Value::Null) => v.push(None),
            (ColumnVec::Int64(v), Value::Int64(i)) => v.push(Some(i)),
            (ColumnVec::Int64(v), Value::Null) => v.push(None),
            (ColumnVec::Float64(v), Value::Float64(f)) => v.push(Some(f)),
            (ColumnVec::Float64(v), Value::Int64(i)) => v.push(Some(i as f64)),
            (ColumnVec::Float64(v), Value::Null) => v.push(None),
            (ColumnVec::Utf8(v), Value::Utf8(s)) => v.push(Some(s)),
            (ColumnVec::Utf8(v), Value::Null) => v.push(None),
            (col, val) => {
                return Err(CurlewError::compute(format!(
                    "cannot push {} value onto {} column",
                    val.value_type(),
                    col.value_type()
                )))
            }
        }
        Ok(())
    }

    /// New column holding the values at `rows`, in order. Indices may repeat.
    pub fn take(&self, rows: &[usize]) -> Result<ColumnVec> {
        let mut out = ColumnVec::with_capacity(self.value_type(), rows.len());
        for &row in rows {
            let val = self.value(row).ok_or_else(|| {
                CurlewError::compute(format!(
                    "row index {row} out of bounds for column of length {}",
                    self.len()
                ))
            })?;
            out.push_value(val)?;
        }
        Ok(out)
    }

    /// Append `other` onto self. Types must match; a `Null` column on either
    /// side promotes to the other's type.
    pub fn try_append(&mut self, other: ColumnVec) -> Result<()> {
        if let ColumnVec::Null(n) = other {
            for _ in 0..n {
                self.push_value(Value::Null)?;
            }
            return Ok(());
        }
        if let ColumnVec::Null(n) = *self {
            let mut promoted = ColumnVec::with_capacity(other.value_type(), n + other.len());
            for _ in 0..n {
                promoted.push_value(Value::Null)?;
            }
            *self = promoted;
        }

        match (&mut *self, other) {
            (ColumnVec::Bool(a), ColumnVec::Bool(b)) => a.extend(b),
            (ColumnVec::Int64(a), ColumnVec::Int64(b)) => a.extend(b),
            (ColumnVec::Float64(a), ColumnVec::Float64(b)) => a.extend(b),
            (ColumnVec::Utf8(a), ColumnVec::Utf8(b)) => a.extend(b),
            (a, b) => {
                return Err(CurlewError::compute(format!(
                    "cannot append {} column onto {} column",
                    b.value_type(),
                    a.value_type()
                )))
            }
        }
        Ok(())
    }

    /// Repeat every value in the column `n` times in place order, e.g.
    /// `[a, b]` with n=2 becomes `[a, a, b, b]`.
    pub fn repeat_each(&self, n: usize) -> ColumnVec {
        let mut out = ColumnVec::with_capacity(self.value_type(), self.len() * n);
        for v in self.iter_values() {
            for _ in 0..n {
                out.push_value(v.clone()).expect("type matches column");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_widens_ints() {
        let col =
            ColumnVec::from_values([Value::Int64(1), Value::Null, Value::Float64(2.5)]).unwrap();
        assert_eq!(col.value_type(), ValueType::Float64);
        assert_eq!(col.value(0), Some(Value::Float64(1.0)));
        assert_eq!(col.value(1), Some(Value::Null));
    }

    #[test]
    fn from_values_rejects_mixed() {
        let err = ColumnVec::from_values([Value::Int64(1), Value::Utf8("x".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("mixed element types"));
    }

    #[test]
    fn append_promotes_null_column() {
        let mut col = ColumnVec::Null(2);
        col.try_append(ColumnVec::int64s(&[7])).unwrap();
        assert_eq!(col.value_type(), ValueType::Int64);
        assert_eq!(col.len(), 3);
        assert_eq!(col.value(0), Some(Value::Null));
        assert_eq!(col.value(2), Some(Value::Int64(7)));
    }

    #[test]
    fn take_reorders_and_repeats() {
        let col = ColumnVec::utf8s(&["a", "b", "c"]);
        let out = col.take(&[2, 0, 0]).unwrap();
        assert_eq!(out, ColumnVec::utf8s(&["c", "a", "a"]));
    }
}
