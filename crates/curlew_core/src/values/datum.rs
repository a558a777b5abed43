//! Results of forcing an expression.

use std::sync::Arc;

use super::{ColumnVec, Value};
use crate::errors::{CurlewError, Result};

/// The value produced by evaluating an expression: a single scalar, one
/// column, or a multi-column record (unpacked into several output columns by
/// the reduction engine).
///
/// Columns are shared behind `Arc` so cloning a datum (memoization, mask
/// bindings) never copies data.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Scalar(Value),
    Vector(Arc<ColumnVec>),
    Record(Vec<(String, Arc<ColumnVec>)>),
}

impl Datum {
    pub fn vector(col: ColumnVec) -> Datum {
        Datum::Vector(Arc::new(col))
    }

    /// Build a record datum, checking that all fields have equal length.
    pub fn record(fields: Vec<(String, ColumnVec)>) -> Result<Datum> {
        let mut len = None;
        for (name, col) in &fields {
            match len {
                None => len = Some(col.len()),
                Some(n) if n == col.len() => {}
                Some(n) => {
                    return Err(CurlewError::compute(format!(
                        "record field `{name}` has length {}, expected {n}",
                        col.len()
                    )))
                }
            }
        }
        Ok(Datum::Record(
            fields
                .into_iter()
                .map(|(name, col)| (name, Arc::new(col)))
                .collect(),
        ))
    }

    /// Number of rows this datum contributes to a block. Scalars count as 1.
    pub fn len(&self) -> usize {
        match self {
            Datum::Scalar(_) => 1,
            Datum::Vector(col) => col.len(),
            Datum::Record(fields) => fields.first().map(|(_, col)| col.len()).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Datum::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// View the datum as a single column, broadcasting a scalar to `rows`
    /// rows. A vector must already have exactly `rows` rows.
    pub fn into_column(self, rows: usize) -> Result<Arc<ColumnVec>> {
        match self {
            Datum::Scalar(v) => Ok(Arc::new(v.repeat(rows))),
            Datum::Vector(col) if col.len() == rows => Ok(col),
            Datum::Vector(col) if col.len() == 1 => {
                let v = col.first_value().unwrap_or(Value::Null);
                Ok(Arc::new(v.repeat(rows)))
            }
            Datum::Vector(col) => Err(CurlewError::compute(format!(
                "cannot use column of length {} where {rows} rows are expected",
                col.len()
            ))),
            Datum::Record(_) => Err(CurlewError::compute(
                "cannot use a record where a single column is expected",
            )),
        }
    }

    /// The scalar at `idx` of a vector datum, or the scalar itself (any idx)
    /// for a scalar datum.
    pub fn value_at(&self, idx: usize) -> Option<Value> {
        match self {
            Datum::Scalar(v) => Some(v.clone()),
            Datum::Vector(col) => col.value(idx),
            Datum::Record(_) => None,
        }
    }
}

impl From<Value> for Datum {
    fn from(v: Value) -> Self {
        Datum::Scalar(v)
    }
}

impl From<ColumnVec> for Datum {
    fn from(col: ColumnVec) -> Self {
        Datum::vector(col)
    }
}

impl From<Arc<ColumnVec>> for Datum {
    fn from(col: Arc<ColumnVec>) -> Self {
        Datum::Vector(col)
    }
}
