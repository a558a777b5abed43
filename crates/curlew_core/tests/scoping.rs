//! Scope preservation through capture, splice, and nested wrappers.

use std::sync::Arc;

use curlew_core::capture::{embrace, Arg, CapturedExpr};
use curlew_core::exec::{group_by, summarize, NamedExpr, ReduceOptions};
use curlew_core::expr::{call, col};
use curlew_core::mask::Mask;
use curlew_core::testutil::{self, CountingSum};
use curlew_core::{ColumnVec, Datum, EvalContext, ScopeArena, Value};

/// A free name inside an embraced expression must resolve in the scope where
/// the expression was written, even when two nested wrappers shadow the same
/// name differently.
#[test]
fn embrace_preserves_the_writing_scope() {
    let mut scopes = ScopeArena::new();
    let functions = testutil::registry();

    // Caller writes `x + offset` with offset = 100.
    let caller = scopes.child(scopes.global());
    scopes.bind(caller, "offset", Value::Int64(100));
    let caller_arg = Arg::Captured(CapturedExpr::capture(col("x").add(col("offset")), caller));

    // Wrapper A shadows `offset`, forwards the caller's capture.
    let scope_a = scopes.child(scopes.global());
    scopes.bind(scope_a, "offset", Value::Int64(-1));
    let spliced_in_a = embrace(&caller_arg).unwrap();
    // A builds `sum({{caller}}) + offset`: the splice must see 100, the
    // sibling `offset` must see A's -1.
    let a_expr = call("sum", [spliced_in_a]).add(col("offset"));
    let a_arg = Arg::Captured(CapturedExpr::capture(a_expr, scope_a));

    // Wrapper B shadows `offset` again and embraces A's expression.
    let scope_b = scopes.child(scopes.global());
    scopes.bind(scope_b, "offset", Value::Int64(-1000));
    let b_expr = embrace(&a_arg).unwrap();
    let b_arg = Arg::Captured(CapturedExpr::capture(b_expr, scope_b));

    let ctx = EvalContext {
        scopes: &scopes,
        functions: &functions,
    };
    let table = testutil::sample_table();

    let out = summarize(
        &table,
        &[NamedExpr::named("v", b_arg)],
        &ctx,
        &ReduceOptions::default(),
    )
    .unwrap();

    // x = 1..5 with offset 100 each: sum = 515; plus A's offset -1.
    assert_eq!(
        out.column_by_name("v").unwrap().value(0),
        Some(Value::Float64(514.0))
    );
}

/// Two splices combined in one tree each keep their own owning scope.
#[test]
fn sibling_splices_keep_independent_scopes() {
    let mut scopes = ScopeArena::new();
    let functions = testutil::registry();

    let left_scope = scopes.child(scopes.global());
    scopes.bind(left_scope, "k", Value::Int64(10));
    let left = Arg::Captured(CapturedExpr::capture(col("k"), left_scope));

    let right_scope = scopes.child(scopes.global());
    scopes.bind(right_scope, "k", Value::Int64(3));
    let right = Arg::Captured(CapturedExpr::capture(col("k"), right_scope));

    let wrapper = scopes.child(scopes.global());
    let combined = embrace(&left).unwrap().mul(embrace(&right).unwrap());
    let arg = Arg::Captured(CapturedExpr::capture(combined, wrapper));

    let ctx = EvalContext {
        scopes: &scopes,
        functions: &functions,
    };
    let out = summarize(
        &testutil::sample_table(),
        &[NamedExpr::named("v", arg)],
        &ctx,
        &ReduceOptions::default(),
    )
    .unwrap();

    assert_eq!(
        out.column_by_name("v").unwrap().value(0),
        Some(Value::Int64(30))
    );
}

/// Forcing the same capture against the same mask twice returns the cached
/// value without re-invoking primitives; a different mask recomputes.
#[test]
fn forcing_is_memoized_per_mask_instance() {
    let scopes = ScopeArena::new();
    let mut functions = testutil::registry();
    let (counting, calls) = CountingSum::new();
    functions.register(Arc::new(counting));

    let ctx = EvalContext {
        scopes: &scopes,
        functions: &functions,
    };
    let table = testutil::sample_table();
    let capture = CapturedExpr::capture(call("counting_sum", [col("x")]), scopes.global());

    let mask_a = Mask::build(&table, None, scopes.global()).unwrap();
    let first = capture.force(&mask_a, &ctx).unwrap();
    let second = capture.force(&mask_a, &ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    let mask_b = Mask::build(&table, None, scopes.global()).unwrap();
    let third = capture.force(&mask_b, &ctx).unwrap();
    assert_eq!(first, third);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

/// The pronoun resolves columns only; scope bindings of the same name are
/// invisible to it, and a shadowing scope binding loses to the column for
/// unqualified names.
#[test]
fn pronoun_and_shadowing_interplay() {
    let mut scopes = ScopeArena::new();
    let functions = testutil::registry();

    let caller = scopes.child(scopes.global());
    scopes.bind(caller, "x", Value::Int64(1_000_000));
    // `.data.x + x`: both sides must be the column.
    let expr = curlew_core::expr::data_col("x").add(col("x"));
    let arg = Arg::Captured(CapturedExpr::capture(expr, caller));

    let ctx = EvalContext {
        scopes: &scopes,
        functions: &functions,
    };
    let out = summarize(
        &group_by(&testutil::sample_table(), &["g"]).unwrap(),
        &[NamedExpr::named("v", Arg::Captured(
            CapturedExpr::capture(call("sum", [embrace(&arg).unwrap()]), scopes.global()),
        ))],
        &ctx,
        &ReduceOptions::default(),
    )
    .unwrap();

    // Per group: sum(2x). a: 2*(1+2)=6, b: 2*(3+4+5)=24.
    assert_eq!(
        **out.column_by_name("v").unwrap(),
        ColumnVec::float64s(&[6.0, 24.0])
    );
}

/// A runtime string names a column through the pronoun's computed access,
/// with no embrace involved.
#[test]
fn computed_pronoun_access_reaches_columns() {
    let mut scopes = ScopeArena::new();
    let functions = testutil::registry();

    let caller = scopes.child(scopes.global());
    scopes.bind(caller, "which", Value::from("y"));
    let expr = call(
        "sum",
        [curlew_core::expr::data_col_expr(col("which"))],
    );
    let arg = Arg::Captured(CapturedExpr::capture(expr, caller));

    let ctx = EvalContext {
        scopes: &scopes,
        functions: &functions,
    };
    let out = summarize(
        &testutil::sample_table(),
        &[NamedExpr::named("total", arg)],
        &ctx,
        &ReduceOptions::default(),
    )
    .unwrap();

    assert_eq!(
        out.column_by_name("total").unwrap().value(0),
        Some(Value::Float64(12.5))
    );
}

/// An evaluated value can still be passed where a datum is accepted, but
/// anything requiring a capture refuses it.
#[test]
fn evaluated_arguments_are_not_captures() {
    let err = embrace(&Arg::Evaluated(Datum::Scalar(Value::Int64(1)))).unwrap_err();
    assert!(matches!(err, curlew_core::CurlewError::Capture { .. }));
}
