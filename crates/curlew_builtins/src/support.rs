//! Shared argument handling for the builtin primitives.

use curlew_core::errors::{CurlewError, Result};
use curlew_core::functions::Invocation;
use curlew_core::values::{ColumnVec, Datum, Value};

/// The first argument, required.
pub(crate) fn arg<'a>(invocation: &'a Invocation<'_>, name: &str) -> Result<&'a Datum> {
    invocation
        .args
        .first()
        .ok_or_else(|| CurlewError::compute(format!("`{name}` needs an argument")))
}

/// Flatten a datum into scalar values. Records are rejected.
pub(crate) fn values_of(datum: &Datum, name: &str) -> Result<Vec<Value>> {
    match datum {
        Datum::Scalar(v) => Ok(vec![v.clone()]),
        Datum::Vector(col) => Ok(col.iter_values().collect()),
        Datum::Record(_) => Err(CurlewError::compute(format!(
            "`{name}` cannot operate on a record"
        ))),
    }
}

/// Numeric view of the input values. `None` means a null was present, which
/// aggregates propagate.
pub(crate) fn numerics(values: &[Value], name: &str) -> Result<Option<Vec<f64>>> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        if v.is_null() {
            return Ok(None);
        }
        match v.as_f64() {
            Some(f) => out.push(f),
            None => {
                return Err(CurlewError::compute(format!(
                    "`{name}` expects numeric input, got {}",
                    v.value_type()
                )))
            }
        }
    }
    Ok(Some(out))
}

/// Whether every non-null input value is an integer, so integer-preserving
/// aggregates can keep the narrower type.
pub(crate) fn all_ints(values: &[Value]) -> bool {
    values
        .iter()
        .all(|v| matches!(v, Value::Int64(_) | Value::Null))
}

/// Apply `f` to each value, preserving the scalar/vector shape of the input.
pub(crate) fn map_elementwise(
    datum: &Datum,
    name: &str,
    f: impl Fn(Value) -> Result<Value>,
) -> Result<Datum> {
    match datum {
        Datum::Scalar(v) => Ok(Datum::Scalar(f(v.clone())?)),
        Datum::Vector(col) => {
            let out = col.iter_values().map(f).collect::<Result<Vec<_>>>()?;
            Ok(Datum::vector(ColumnVec::from_values(out)?))
        }
        Datum::Record(_) => Err(CurlewError::compute(format!(
            "`{name}` cannot operate on a record"
        ))),
    }
}

/// An optional scalar integer argument at `idx`, defaulting to `default`.
pub(crate) fn int_arg(
    invocation: &Invocation<'_>,
    idx: usize,
    default: i64,
    name: &str,
) -> Result<i64> {
    match invocation.args.get(idx) {
        None => Ok(default),
        Some(Datum::Scalar(Value::Int64(v))) => Ok(*v),
        Some(other) => Err(CurlewError::compute(format!(
            "`{name}` expects a scalar integer argument, got {} value(s)",
            other.len()
        ))),
    }
}
