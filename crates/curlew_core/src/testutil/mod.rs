//! Test support: tiny primitives and table fixtures.
//!
//! These callables exist so the core's own tests don't depend on the real
//! primitive library; they implement just enough numeric behavior to drive
//! the engines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::{CurlewError, Result};
use crate::functions::{Arity, Callable, FunctionRegistry, Invocation};
use crate::table::Table;
use crate::values::{ColumnVec, Datum, Value};

fn single_column<'a>(invocation: &'a Invocation<'_>, name: &str) -> Result<&'a Datum> {
    invocation
        .args
        .first()
        .ok_or_else(|| CurlewError::compute(format!("`{name}` needs an argument")))
}

fn numeric_values(datum: &Datum, name: &str) -> Result<Vec<f64>> {
    let values: Vec<Value> = match datum {
        Datum::Scalar(v) => vec![v.clone()],
        Datum::Vector(col) => col.iter_values().collect(),
        Datum::Record(_) => {
            return Err(CurlewError::compute(format!(
                "`{name}` cannot aggregate a record"
            )))
        }
    };
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                CurlewError::compute(format!("`{name}` expects numeric input"))
            })
        })
        .collect()
}

#[derive(Debug)]
pub struct TestSum;

impl Callable for TestSum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let datum = single_column(invocation, "sum")?;
        let sum: f64 = numeric_values(datum, "sum")?.iter().sum();
        Ok(Datum::Scalar(Value::Float64(sum)))
    }
}

#[derive(Debug)]
pub struct TestMean;

impl Callable for TestMean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let datum = single_column(invocation, "mean")?;
        let values = numeric_values(datum, "mean")?;
        if values.is_empty() {
            return Ok(Datum::Scalar(Value::Null));
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Ok(Datum::Scalar(Value::Float64(mean)))
    }
}

/// Group row counter; zero arguments.
#[derive(Debug)]
pub struct TestN;

impl Callable for TestN {
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

/// Identity transform, returning its input column unchanged. Length equals
/// the block's row count, which makes it useful for transform tests.
#[derive(Debug)]
pub struct TestIdentity;

impl Callable for TestIdentity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        Ok(single_column(invocation, "identity")?.clone())
    }
}

/// Returns its argument's values as a two-field record `{lo, hi}` holding
/// min and max. Exercises record unpacking.
#[derive(Debug)]
pub struct TestRange;

impl Callable for TestRange {
    fn name(&self) -> &'static str {
        "value_range"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let values = numeric_values(single_column(invocation, "value_range")?, "value_range")?;
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Datum::record(vec![
            ("lo".to_string(), ColumnVec::float64s(&[lo])),
            ("hi".to_string(), ColumnVec::float64s(&[hi])),
        ])
    }
}

/// A sum that counts how many times it actually runs, for memoization tests.
#[derive(Debug)]
pub struct CountingSum {
    calls: Arc<AtomicUsize>,
}

impl CountingSum {
    pub fn new() -> (CountingSum, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            CountingSum {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Callable for CountingSum {
    fn name(&self) -> &'static str {
        "counting_sum"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sum: f64 = numeric_values(single_column(invocation, "counting_sum")?, "counting_sum")?
            .iter()
            .sum();
        Ok(Datum::Scalar(Value::Float64(sum)))
    }
}

/// Registry holding every test primitive.
pub fn registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(TestSum));
    registry.register(Arc::new(TestMean));
    registry.register(Arc::new(TestN));
    registry.register(Arc::new(TestIdentity));
    registry.register(Arc::new(TestRange));
    registry
}

/// Five rows, two groups: `g = [a, a, b, b, b]`, `x = [1..5]`,
/// `y = [0.5, 1.5, 2.5, 3.5, 4.5]`.
pub fn sample_table() -> Table {
    Table::try_new([
        (
            "g".to_string(),
            ColumnVec::utf8s(&["a", "a", "b", "b", "b"]),
        ),
        ("x".to_string(), ColumnVec::int64s(&[1, 2, 3, 4, 5])),
        (
            "y".to_string(),
            ColumnVec::float64s(&[0.5, 1.5, 2.5, 3.5, 4.5]),
        ),
    ])
    .unwrap()
}
