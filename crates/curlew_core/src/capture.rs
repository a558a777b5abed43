//! Deferred, scope-carrying expressions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{CurlewError, Result};
use crate::expr::evaluator::{evaluate, EvalContext};
use crate::expr::Expression;
use crate::mask::{Mask, MaskId};
use crate::scope::ScopeId;
use crate::values::Datum;

#[derive(Debug, Clone)]
struct Memo {
    mask: MaskId,
    value: Datum,
}

/// An expression paired with the scope it was written in.
///
/// Capturing never evaluates: the tree is held until [`CapturedExpr::force`]
/// resolves it against a mask. Free names inside the tree resolve through the
/// mask's column layers first, then through the capture's own scope chain,
/// regardless of where the capture is eventually forced.
#[derive(Clone)]
pub struct CapturedExpr {
    expr: Arc<Expression>,
    scope: ScopeId,
    label: Option<Arc<str>>,
    memo: Arc<Mutex<Option<Memo>>>,
}

impl CapturedExpr {
    /// Capture `expr` as written in `scope`.
    pub fn capture(expr: Expression, scope: ScopeId) -> CapturedExpr {
        CapturedExpr {
            expr: Arc::new(expr),
            scope,
            label: None,
            memo: Arc::new(Mutex::new(None)),
        }
    }

    /// Attach an explicit label, overriding the rendered-syntax default.
    pub fn with_label(mut self, label: impl Into<String>) -> CapturedExpr {
        self.label = Some(Arc::from(label.into().as_str()));
        self
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Human-readable label: the explicit override if set, otherwise the
    /// expression rendered as text. Never evaluates.
    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.to_string(),
            None => self.expr.to_string(),
        }
    }

    /// Evaluate the tree against `mask`, with this capture's own scope as the
    /// ambient scope.
    ///
    /// Memoized per mask instance: forcing twice against the same mask
    /// returns the cached value without re-evaluating (primitives are not
    /// re-invoked). Forcing against a different mask recomputes and replaces
    /// the cache; at most one cached value exists at a time.
    pub fn force(&self, mask: &Mask, ctx: &EvalContext<'_>) -> Result<Datum> {
        if let Some(memo) = &*self.memo.lock() {
            if memo.mask == mask.id() {
                return Ok(memo.value.clone());
            }
        }
        let value = evaluate(&self.expr, mask, ctx, self.scope)?;
        *self.memo.lock() = Some(Memo {
            mask: mask.id(),
            value: value.clone(),
        });
        Ok(value)
    }
}

impl fmt::Debug for CapturedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedExpr")
            .field("expr", &self.expr)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Captures compare by tree and owning scope; the memo slot is ignored.
impl PartialEq for CapturedExpr {
    fn eq(&self, other: &CapturedExpr) -> bool {
        self.scope == other.scope && self.expr == other.expr
    }
}

/// A masking argument to a verb: either still deferred, or a value the
/// caller already evaluated.
#[derive(Debug, Clone)]
pub enum Arg {
    Captured(CapturedExpr),
    Evaluated(Datum),
}

impl Arg {
    /// The capture inside, or a capture error naming the operation that
    /// required one.
    pub fn as_capture(&self, context: &str) -> Result<&CapturedExpr> {
        match self {
            Arg::Captured(capture) => Ok(capture),
            Arg::Evaluated(_) => Err(CurlewError::capture(context)),
        }
    }

    /// Label for naming and error messages.
    pub fn label(&self) -> String {
        match self {
            Arg::Captured(capture) => capture.label(),
            Arg::Evaluated(_) => "<value>".to_string(),
        }
    }
}

impl From<CapturedExpr> for Arg {
    fn from(capture: CapturedExpr) -> Self {
        Arg::Captured(capture)
    }
}

/// Wrap a captured argument as a splice node for insertion into a new
/// expression, preserving its original owning scope.
///
/// When the assembled expression is later forced, the splice evaluates with
/// the capture's scope while sibling nodes use the assembling expression's
/// scope. Errors with [`CurlewError::Capture`] if the argument was already
/// evaluated.
pub fn embrace(arg: &Arg) -> Result<Expression> {
    Ok(Expression::Splice(arg.as_capture("embrace")?.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{call, col};
    use crate::scope::ScopeArena;

    #[test]
    fn capture_does_not_evaluate() {
        let arena = ScopeArena::new();
        // `missing` resolves nowhere, but capturing must not care.
        let capture = CapturedExpr::capture(col("missing"), arena.global());
        assert_eq!(capture.label(), "missing");
    }

    #[test]
    fn embrace_rejects_evaluated_values() {
        let arg = Arg::Evaluated(Datum::Scalar(crate::values::Value::Int64(3)));
        let err = embrace(&arg).unwrap_err();
        assert!(matches!(err, CurlewError::Capture { .. }));
    }

    #[test]
    fn label_override_wins() {
        let arena = ScopeArena::new();
        let capture = CapturedExpr::capture(call("mean", [col("x")]), arena.global())
            .with_label("centered");
        assert_eq!(capture.label(), "centered");
    }
}
