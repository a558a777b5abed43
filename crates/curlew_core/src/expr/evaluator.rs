//! Mask-driven expression evaluation.
//!
//! The evaluator threads an *ambient scope* through the tree. Ordinary nodes
//! resolve free names against the mask with that scope as the final layer;
//! splice nodes switch the ambient scope to the spliced capture's own scope
//! while still sharing the mask's column layers. Expressions therefore
//! resolve where they were written, not where they are forced.

use super::{BinaryOperator, Expression, PronounAccess, UnaryOperator};
use crate::errors::{CurlewError, Result};
use crate::functions::{FunctionRegistry, Invocation};
use crate::mask::Mask;
use crate::scope::{ScopeArena, ScopeId};
use crate::values::{ColumnVec, Datum, Value};

/// Shared evaluation state: the scope arena and the primitive registry.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub scopes: &'a ScopeArena,
    pub functions: &'a FunctionRegistry,
}

/// Evaluate `expr` against `mask`, resolving scope-layer names through the
/// chain rooted at `ambient`.
pub fn evaluate(
    expr: &Expression,
    mask: &Mask,
    ctx: &EvalContext<'_>,
    ambient: ScopeId,
) -> Result<Datum> {
    match expr {
        Expression::Ident(name) => mask.lookup(name, ambient, ctx.scopes),
        Expression::Literal(value) => Ok(Datum::Scalar(value.clone())),
        Expression::Pronoun(PronounAccess::Field(name)) => mask.lookup_data(name),
        Expression::Pronoun(PronounAccess::Computed(name_expr)) => {
            let name = evaluate(name_expr, mask, ctx, ambient)?;
            let name = match name {
                Datum::Scalar(value) => value.try_into_column_name()?,
                other => {
                    return Err(CurlewError::compute(format!(
                        "computed column name must be a single string, got {} values",
                        other.len()
                    )))
                }
            };
            mask.lookup_data(&name)
        }
        Expression::Call { name, args } => {
            let callable = ctx
                .functions
                .get(name)
                .ok_or_else(|| CurlewError::unresolved(name.clone(), "function registry"))?;
            callable.arity().check(name, args.len())?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, mask, ctx, ambient))
                .collect::<Result<Vec<_>>>()?;
            callable.invoke(&Invocation {
                args: &args,
                rows: mask.rows(),
            })
        }
        Expression::Unary { op, expr } => {
            let input = evaluate(expr, mask, ctx, ambient)?;
            apply_unary(*op, input)
        }
        Expression::Binary { op, left, right } => {
            let left = evaluate(left, mask, ctx, ambient)?;
            let right = evaluate(right, mask, ctx, ambient)?;
            apply_binary(*op, left, right)
        }
        // The scope switch: the capture evaluates with its own owning scope.
        Expression::Splice(capture) => capture.force(mask, ctx),
    }
}

fn apply_unary(op: UnaryOperator, input: Datum) -> Result<Datum> {
    let map = |value: Value| -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match op {
            UnaryOperator::Neg => match value {
                Value::Int64(v) => Ok(Value::Int64(-v)),
                Value::Float64(v) => Ok(Value::Float64(-v)),
                other => Err(CurlewError::compute(format!(
                    "cannot negate {} value",
                    other.value_type()
                ))),
            },
            UnaryOperator::Not => match value {
                Value::Bool(v) => Ok(Value::Bool(!v)),
                other => Err(CurlewError::compute(format!(
                    "cannot logically negate {} value",
                    other.value_type()
                ))),
            },
        }
    };

    match input {
        Datum::Scalar(value) => Ok(Datum::Scalar(map(value)?)),
        Datum::Vector(col) => {
            let out = col.iter_values().map(map).collect::<Result<Vec<_>>>()?;
            Ok(Datum::vector(ColumnVec::from_values(out)?))
        }
        Datum::Record(_) => Err(CurlewError::compute(
            "cannot apply an operator to a record value",
        )),
    }
}

fn apply_binary(op: BinaryOperator, left: Datum, right: Datum) -> Result<Datum> {
    if matches!(left, Datum::Record(_)) || matches!(right, Datum::Record(_)) {
        return Err(CurlewError::compute(
            "cannot apply an operator to a record value",
        ));
    }

    let llen = left.len();
    let rlen = right.len();
    let target = llen.max(rlen);
    // Length-1 results recycle; anything else must line up exactly.
    if (llen != 1 && llen != target) || (rlen != 1 && rlen != target) {
        return Err(CurlewError::compute(format!(
            "operand lengths {llen} and {rlen} for `{op}` do not line up"
        )));
    }

    let value_at = |datum: &Datum, idx: usize| -> Value {
        let idx = if datum.len() == 1 { 0 } else { idx };
        datum.value_at(idx).unwrap_or(Value::Null)
    };

    let both_scalar = matches!(left, Datum::Scalar(_)) && matches!(right, Datum::Scalar(_));
    let mut out = Vec::with_capacity(target);
    for idx in 0..target {
        out.push(binary_values(op, value_at(&left, idx), value_at(&right, idx))?);
    }

    if both_scalar {
        Ok(Datum::Scalar(out.pop().unwrap_or(Value::Null)))
    } else {
        Ok(Datum::vector(ColumnVec::from_values(out)?))
    }
}

fn binary_values(op: BinaryOperator, left: Value, right: Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    if op.is_logical() {
        let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) else {
            return Err(CurlewError::compute(format!(
                "`{op}` expects bool operands, got {} and {}",
                left.value_type(),
                right.value_type()
            )));
        };
        let v = match op {
            BinaryOperator::And => l && r,
            BinaryOperator::Or => l || r,
            _ => unreachable!("checked logical"),
        };
        return Ok(Value::Bool(v));
    }

    if op.is_comparison() {
        let ord = match (&left, &right) {
            (Value::Utf8(l), Value::Utf8(r)) => l.partial_cmp(r),
            (Value::Bool(l), Value::Bool(r)) => l.partial_cmp(r),
            _ => match (left.as_f64(), right.as_f64()) {
                // NaN comparisons produce null, like any unordered pair.
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => {
                    return Err(CurlewError::compute(format!(
                        "cannot compare {} with {}",
                        left.value_type(),
                        right.value_type()
                    )))
                }
            },
        };
        let Some(ord) = ord else { return Ok(Value::Null) };
        let v = match op {
            BinaryOperator::Eq => ord.is_eq(),
            BinaryOperator::NotEq => ord.is_ne(),
            BinaryOperator::Lt => ord.is_lt(),
            BinaryOperator::LtEq => ord.is_le(),
            BinaryOperator::Gt => ord.is_gt(),
            BinaryOperator::GtEq => ord.is_ge(),
            _ => unreachable!("checked comparison"),
        };
        return Ok(Value::Bool(v));
    }

    // Arithmetic. Division always widens to float.
    match (&left, &right) {
        (Value::Int64(l), Value::Int64(r)) if op != BinaryOperator::Div => {
            let v = match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Sub => l - r,
                BinaryOperator::Mul => l * r,
                _ => unreachable!("checked arithmetic"),
            };
            Ok(Value::Int64(v))
        }
        _ => {
            let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
                return Err(CurlewError::compute(format!(
                    "`{op}` expects numeric operands, got {} and {}",
                    left.value_type(),
                    right.value_type()
                )));
            };
            let v = match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Sub => l - r,
                BinaryOperator::Mul => l * r,
                BinaryOperator::Div => l / r,
                _ => unreachable!("checked arithmetic"),
            };
            Ok(Value::Float64(v))
        }
    }
}
