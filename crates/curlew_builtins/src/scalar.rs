//! Elementwise scalar primitives.

use curlew_core::errors::{CurlewError, Result};
use curlew_core::functions::{Arity, Callable, Invocation};
use curlew_core::values::{Datum, Value};

use crate::support::{arg, int_arg, map_elementwise};

#[derive(Debug, Clone, Copy)]
pub struct Abs;

impl Callable for Abs {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        map_elementwise(arg(invocation, "abs")?, "abs", |v| match v {
            Value::Null => Ok(Value::Null),
            Value::Int64(i) => Ok(Value::Int64(i.abs())),
            Value::Float64(f) => Ok(Value::Float64(f.abs())),
            other => Err(CurlewError::compute(format!(
                "`abs` expects numeric input, got {}",
                other.value_type()
            ))),
        })
    }
}

/// Round to a number of digits (default 0). Always produces floats.
#[derive(Debug, Clone, Copy)]
pub struct Round;

impl Callable for Round {
    fn name(&self) -> &'static str {
        "round"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum> {
        let digits = int_arg(invocation, 1, 0, "round")?;
        let factor = 10f64.powi(digits as i32);
        map_elementwise(arg(invocation, "round")?, "round", move |v| match v {
            Value::Null => Ok(Value::Null),
            other => {
                let f = other.as_f64().ok_or_else(|| {
                    CurlewError::compute(format!(
                        "`round` expects numeric input, got {}",
                        other.value_type()
                    ))
                })?;
                Ok(Value::Float64((f * factor).round() / factor))
            }
        })
    }
}
