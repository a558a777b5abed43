//! Aggregate primitives: one scalar out per group block.
//!
//! Aggregates propagate nulls: a null anywhere in the input yields a null
//! result. Use a filter first to drop nulls instead.

use std::collections::HashSet;

use curlew_core::errors::{CurlewError, Result};
use curlew_core::functions::{Arity, Callable, Invocation};
use curlew_core::values::{Datum, Value};

use crate::support::{all_ints, arg, int_arg, numerics, values_of};

/// Row count of the current block. Zero arguments.
#[derive(Debug, Clone, Copy)]
pub struct N;

impl Callable for N {
    fn name(&self) -> &'static str {
        "n"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        Ok(Datum::Scalar(Value::Int64(invocation.rows as i64)))
    }
}

/// Count of non-null values.
#[derive(Debug, Clone, Copy)]
pub struct Count;

impl Callable for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "count")?, "count")?;
        let n = values.iter().filter(|v| !v.is_null()).count();
        Ok(Datum::Scalar(Value::Int64(n as i64)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sum;

impl Callable for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "sum")?, "sum")?;
        let Some(nums) = numerics(&values, "sum")? else {
            return Ok(Datum::Scalar(Value::Null));
        };
        // Integer input keeps an integer sum.
        if all_ints(&values) {
            Ok(Datum::Scalar(Value::Int64(nums.iter().map(|&f| f as i64).sum())))
        } else {
            Ok(Datum::Scalar(Value::Float64(nums.iter().sum())))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mean;

impl Callable for Mean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["avg"]
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "mean")?, "mean")?;
        let Some(nums) = numerics(&values, "mean")? else {
            return Ok(Datum::Scalar(Value::Null));
        };
        if nums.is_empty() {
            return Ok(Datum::Scalar(Value::Null));
        }
        Ok(Datum::Scalar(Value::Float64(
            nums.iter().sum::<f64>() / nums.len() as f64,
        )))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Median;

impl Callable for Median {
    fn name(&self) -> &'static str {
        "median"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "median")?, "median")?;
        let Some(mut nums) = numerics(&values, "median")? else {
            return Ok(Datum::Scalar(Value::Null));
        };
        if nums.is_empty() {
            return Ok(Datum::Scalar(Value::Null));
        }
        nums.sort_by(f64::total_cmp);
        let mid = nums.len() / 2;
        let median = if nums.len() % 2 == 1 {
            nums[mid]
        } else {
            (nums[mid - 1] + nums[mid]) / 2.0
        };
        Ok(Datum::Scalar(Value::Float64(median)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Min;

#[derive(Debug, Clone, Copy)]
pub struct Max;

fn extremum(invocation: &Invocation<'_>, name: &str, want_max: bool) -> Result<Datum> {
    let values = values_of(arg(invocation, name)?, name)?;
    if values.iter().any(Value::is_null) {
        return Ok(Datum::Scalar(Value::Null));
    }
    let mut best: Option<Value> = None;
    for v in values {
        best = Some(match best {
            None => v,
            Some(b) => {
                let take = if want_max {
                    v.total_cmp(&b).is_gt()
                } else {
                    v.total_cmp(&b).is_lt()
                };
                if take { v } else { b }
            }
        });
    }
    best.map(Datum::Scalar)
        .ok_or_else(|| CurlewError::compute(format!("`{name}` over an empty block")))
}

impl Callable for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        extremum(invocation, "min", false)
    }
}

impl Callable for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        extremum(invocation, "max", true)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct First;

#[derive(Debug, Clone, Copy)]
pub struct Last;

impl Callable for First {
    fn name(&self) -> &'static str {
        "first"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "first")?, "first")?;
        Ok(Datum::Scalar(values.into_iter().next().unwrap_or(Value::Null)))
    }
}

impl Callable for Last {
    fn name(&self) -> &'static str {
        "last"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "last")?, "last")?;
        Ok(Datum::Scalar(values.into_iter().next_back().unwrap_or(Value::Null)))
    }
}

/// The value at a zero-based position within the block.
#[derive(Debug, Clone, Copy)]
pub struct Nth;

impl Callable for Nth {
    fn name(&self) -> &'static str {
        "nth"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "nth")?, "nth")?;
        let idx = int_arg(invocation, 1, 0, "nth")?;
        if idx < 0 {
            return Err(CurlewError::compute("`nth` position must be non-negative"));
        }
        Ok(Datum::Scalar(
            values.into_iter().nth(idx as usize).unwrap_or(Value::Null),
        ))
    }
}

/// Number of distinct values; null counts as a value.
#[derive(Debug, Clone, Copy)]
pub struct NDistinct;

impl Callable for NDistinct {
    fn name(&self) -> &'static str {
        "n_distinct"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = values_of(arg(invocation, "n_distinct")?, "n_distinct")?;
        let distinct: HashSet<Value> = values.into_iter().collect();
        Ok(Datum::Scalar(Value::Int64(distinct.len() as i64)))
    }
}
