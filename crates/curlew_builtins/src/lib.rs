//! Builtin aggregate/transform primitives for the curlew grammar.
//!
//! The core treats these as opaque callables behind
//! [`curlew_core::functions::Callable`]; everything numeric lives here.

pub mod aggregate;
pub mod scalar;
mod support;
pub mod window;

use std::sync::Arc;

use curlew_core::functions::FunctionRegistry;
use once_cell::sync::Lazy;

static DEFAULT_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut registry = FunctionRegistry::new();

    registry.register(Arc::new(aggregate::N));
    registry.register(Arc::new(aggregate::Count));
    registry.register(Arc::new(aggregate::Sum));
    registry.register(Arc::new(aggregate::Mean));
    registry.register(Arc::new(aggregate::Median));
    registry.register(Arc::new(aggregate::Min));
    registry.register(Arc::new(aggregate::Max));
    registry.register(Arc::new(aggregate::First));
    registry.register(Arc::new(aggregate::Last));
    registry.register(Arc::new(aggregate::Nth));
    registry.register(Arc::new(aggregate::NDistinct));

    registry.register(Arc::new(window::RowNumber));
    registry.register(Arc::new(window::MinRank));
    registry.register(Arc::new(window::Lag));
    registry.register(Arc::new(window::CumSum));

    registry.register(Arc::new(scalar::Abs));
    registry.register(Arc::new(scalar::Round));

    registry
});

/// A registry holding every builtin.
pub fn registry() -> FunctionRegistry {
    DEFAULT_REGISTRY.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use curlew_core::functions::Invocation;
    use curlew_core::values::{ColumnVec, Datum, Value};

    fn invoke_one(name: &str, datum: Datum, rows: usize) -> Datum {
        let registry = registry();
        let callable = registry.get(name).unwrap();
        let args = vec![datum];
        callable.invoke(&Invocation { args: &args, rows }).unwrap()
    }

    #[test]
    fn registry_knows_aliases() {
        let registry = registry();
        assert!(registry.get("mean").is_some());
        assert!(registry.get("avg").is_some());
        assert!(registry.get("rank").is_some());
    }

    #[test]
    fn sum_keeps_integer_input_integer() {
        let out = invoke_one("sum", Datum::vector(ColumnVec::int64s(&[1, 2, 3])), 3);
        assert_eq!(out, Datum::Scalar(Value::Int64(6)));

        let out = invoke_one("sum", Datum::vector(ColumnVec::float64s(&[0.5, 1.0])), 2);
        assert_eq!(out, Datum::Scalar(Value::Float64(1.5)));
    }

    #[test]
    fn aggregates_propagate_nulls() {
        let with_null = Datum::vector(ColumnVec::Int64(vec![Some(1), None, Some(3)]));
        assert_eq!(invoke_one("sum", with_null.clone(), 3), Datum::Scalar(Value::Null));
        assert_eq!(invoke_one("mean", with_null.clone(), 3), Datum::Scalar(Value::Null));
        assert_eq!(invoke_one("min", with_null.clone(), 3), Datum::Scalar(Value::Null));
        // count and n_distinct do not.
        assert_eq!(invoke_one("count", with_null.clone(), 3), Datum::Scalar(Value::Int64(2)));
        assert_eq!(
            invoke_one("n_distinct", with_null, 3),
            Datum::Scalar(Value::Int64(3))
        );
    }

    #[test]
    fn median_of_even_and_odd_counts() {
        let out = invoke_one("median", Datum::vector(ColumnVec::int64s(&[4, 1, 3])), 3);
        assert_eq!(out, Datum::Scalar(Value::Float64(3.0)));
        let out = invoke_one("median", Datum::vector(ColumnVec::int64s(&[4, 1, 3, 2])), 4);
        assert_eq!(out, Datum::Scalar(Value::Float64(2.5)));
    }

    #[test]
    fn min_rank_handles_ties_and_nulls() {
        let out = invoke_one(
            "min_rank",
            Datum::vector(ColumnVec::Int64(vec![
                Some(30),
                Some(10),
                None,
                Some(10),
            ])),
            4,
        );
        assert_eq!(
            out,
            Datum::vector(ColumnVec::Int64(vec![Some(3), Some(1), None, Some(1)]))
        );
    }

    #[test]
    fn lag_shifts_with_leading_nulls() {
        let out = invoke_one("lag", Datum::vector(ColumnVec::int64s(&[1, 2, 3])), 3);
        assert_eq!(
            out,
            Datum::vector(ColumnVec::Int64(vec![None, Some(1), Some(2)]))
        );
    }

    #[test]
    fn cumsum_runs_and_poisons_after_null() {
        let out = invoke_one("cumsum", Datum::vector(ColumnVec::int64s(&[1, 2, 3])), 3);
        assert_eq!(out, Datum::vector(ColumnVec::int64s(&[1, 3, 6])));

        let out = invoke_one(
            "cumsum",
            Datum::vector(ColumnVec::Int64(vec![Some(1), None, Some(3)])),
            3,
        );
        assert_eq!(
            out,
            Datum::vector(ColumnVec::Int64(vec![Some(1), None, None]))
        );
    }

    #[test]
    fn row_number_is_one_based() {
        let registry = registry();
        let callable = registry.get("row_number").unwrap();
        let out = callable.invoke(&Invocation { args: &[], rows: 3 }).unwrap();
        assert_eq!(out, Datum::vector(ColumnVec::int64s(&[1, 2, 3])));
    }

    #[test]
    fn round_to_digits() {
        let registry = registry();
        let callable = registry.get("round").unwrap();
        let args = vec![
            Datum::Scalar(Value::Float64(2.3456)),
            Datum::Scalar(Value::Int64(2)),
        ];
        let out = callable
            .invoke(&Invocation { args: &args, rows: 1 })
            .unwrap();
        assert_eq!(out, Datum::Scalar(Value::Float64(2.35)));
    }
}
