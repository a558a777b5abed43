//! Window/transform primitives: one value out per row of the block.

use curlew_core::errors::{CurlewError, Result};
use curlew_core::functions::{Arity, Callable, Invocation};
use curlew_core::values::{ColumnVec, Datum, Value};

use crate::support::{all_ints, arg, int_arg, values_of};

/// 1-based row number within the block. Zero arguments.
#[derive(Debug, Clone, Copy)]
pub struct RowNumber;

impl Callable for RowNumber {
    fn name(&self) -> &'static str {
        "row_number"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let numbers: Vec<i64> = (1..=invocation.rows as i64).collect();
        Ok(Datum::vector(ColumnVec::int64s(&numbers)))
    }
}

/// Minimum rank, ascending, 1-based. Ties share the smallest rank; nulls
/// rank as null.
#[derive(Debug, Clone, Copy)]
pub struct MinRank;

impl Callable for MinRank {
    fn name(&self) -> &'static str {
        "min_rank"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["rank"]
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "min_rank")?, "min_rank")?;
        let out: Vec<Value> = values
            .iter()
            .map(|v| {
                if v.is_null() {
                    return Value::Null;
                }
                let smaller = values
                    .iter()
                    .filter(|o| !o.is_null() && o.total_cmp(v).is_lt())
                    .count();
                Value::Int64(smaller as i64 + 1)
            })
            .collect();
        Ok(Datum::vector(ColumnVec::from_values(out)?))
    }
}

/// Values shifted down by an offset (default 1), nulls filling the gap.
#[derive(Debug, Clone, Copy)]
pub struct Lag;

impl Callable for Lag {
    fn name(&self) -> &'static str {
        "lag"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "lag")?, "lag")?;
        let offset = int_arg(invocation, 1, 1, "lag")?;
        if offset < 0 {
            return Err(CurlewError::compute("`lag` offset must be non-negative"));
        }
        let offset = offset as usize;
        let out: Vec<Value> = (0..values.len())
            .map(|i| {
                if i < offset {
                    Value::Null
                } else {
                    values[i - offset].clone()
                }
            })
            .collect();
        Ok(Datum::vector(ColumnVec::from_values(out)?))
    }
}

/// Running sum. A null makes the remainder of the block null.
#[derive(Debug, Clone, Copy)]
pub struct CumSum;

impl Callable for CumSum {
    fn name(&self) -> &'static str {
        "cumsum"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "cumsum")?, "cumsum")?;
        let ints = all_ints(&values);
        let mut running = 0.0;
        let mut poisoned = false;
        let mut out = Vec::with_capacity(values.len());
        for v in &values {
            if poisoned || v.is_null() {
                poisoned = true;
                out.push(Value::Null);
                continue;
            }
            let f = v.as_f64().ok_or_else(|| {
                CurlewError::compute(format!(
                    "`cumsum` expects numeric input, got {}",
                    v.value_type()
                ))
            })?;
            running += f;
            out.push(if ints {
                Value::Int64(running as i64)
            } else {
                Value::Float64(running)
            });
        }
        Ok(Datum::vector(ColumnVec::from_values(out)?))
    }
}
