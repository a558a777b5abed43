//! The primitive-library interface.
//!
//! The core invokes named aggregate/transform primitives as opaque callables
//! with a declared arity; their numeric semantics live in a collaborator
//! crate. The evaluator checks arity before invoking.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use ahash::RandomState;

use crate::errors::{CurlewError, Result};
use crate::values::Datum;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    /// Calls with the same arguments may return different values.
    Volatile,
    /// Consistent within one verb call.
    Consistent,
}

/// Declared argument count for a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn check(&self, name: &str, got: usize) -> Result<()> {
        let ok = match self {
            Arity::Exact(n) => got == *n,
            Arity::AtLeast(n) => got >= *n,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Arity::Exact(n) => format!("{n}"),
            Arity::AtLeast(n) => format!("at least {n}"),
        };
        Err(CurlewError::compute(format!(
            "`{name}` expects {expected} argument(s), got {got}"
        )))
    }
}

/// One invocation of a callable: the evaluated arguments plus the row count
/// of the block being evaluated, so zero-argument primitives like a group
/// row counter can work.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub args: &'a [Datum],
    pub rows: usize,
}

/// A named primitive supplied by a collaborator library.
pub trait Callable: Debug + Send + Sync {
    /// Name of the function.
    fn name(&self) -> &'static str;

    /// Alternate names registered alongside the primary one.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn arity(&self) -> Arity;

    fn volatility(&self) -> Volatility {
        Volatility::Consistent
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<Datum>;
}

/// Name-to-callable registry consulted by the evaluator.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Callable>, RandomState>,
}

impl FunctionRegistry {
    pub fn new() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// Register a callable under its name and all of its aliases. Later
    /// registrations shadow earlier ones.
    pub fn register(&mut self, callable: Arc<dyn Callable>) {
        for alias in callable.aliases() {
            self.functions.insert(alias.to_string(), callable.clone());
        }
        self.functions
            .insert(callable.name().to_string(), callable);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Callable>> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    #[derive(Debug)]
    struct Always7;

    impl Callable for Always7 {
        fn name(&self) -> &'static str {
            "always7"
        }

        fn aliases(&self) -> &'static [&'static str] {
            &["seven"]
        }

        fn arity(&self) -> Arity {
            Arity::Exact(0)
        }

        fn invoke(&self, _invocation: &Invocation<'_>) -> Result<Datum> {
            Ok(Datum::Scalar(Value::Int64(7)))
        }
    }

    #[test]
    fn register_includes_aliases() {
        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(Always7));
        assert!(registry.get("always7").is_some());
        assert!(registry.get("seven").is_some());
        assert!(registry.get("eight").is_none());
    }

    #[test]
    fn arity_check_messages() {
        let err = Arity::Exact(2).check("sum", 1).unwrap_err();
        assert!(err.to_string().contains("`sum` expects 2"));
        assert!(Arity::AtLeast(1).check("coalesce", 3).is_ok());
    }
}
