//! Per-group column transformation and row filtering.

use crate::capture::{Arg, CapturedExpr};
use crate::errors::{CurlewError, Result};
use crate::expr::evaluator::EvalContext;
use crate::expr::{call, col};
use crate::mask::Mask;
use crate::scope::{ScopeArena, ScopeId};
use crate::select::{resolve, Selector};
use crate::table::{GroupOrder, GroupedTable, Table, TableAccess};
use crate::template::{NameSpec, NameTemplate, TemplateEnv};
use crate::values::{ColumnVec, Datum, Value};

use super::reduce::with_group_context;
use super::NamedExpr;

/// Column transformation: evaluate expressions per group, then scatter the
/// results back into the table's original row order.
///
/// Results must have the group's row count or length 1 (recycled). A name
/// that exists in the input replaces that column in place; new names append
/// in first-definition order. Grouping metadata is preserved.
pub fn mutate(table: &Table, exprs: &[NamedExpr], ctx: &EvalContext<'_>) -> Result<Table> {
    let grouped = GroupedTable::from_table(table, GroupOrder::FirstAppearance)?;
    let key_names = grouped.key_names();

    let names = exprs
        .iter()
        .map(|e| e.resolve_name(ctx.scopes))
        .collect::<Result<Vec<_>>>()?;
    for name in &names {
        if key_names.contains(name) {
            return Err(CurlewError::compute(format!(
                "cannot rebind grouping key `{name}` inside a transform"
            )));
        }
    }

    let total_rows = table.num_rows();
    // Scatter buffers, keyed by output name, in first-definition order.
    let mut buffers: Vec<(String, Vec<Value>)> = Vec::new();

    for desc in grouped.groups() {
        let group_rows = desc.rows.len();
        let mut mask = Mask::build(table, Some(desc), ctx.scopes.global())?;

        for (ordinal, (ne, name)) in exprs.iter().zip(&names).enumerate() {
            let label = ne.arg.label();
            let result = match &ne.arg {
                Arg::Captured(capture) => capture.force(&mask, ctx),
                Arg::Evaluated(datum) => Ok(datum.clone()),
            }
            .map_err(|e| with_group_context(e, desc, key_names, ordinal, &label))?;

            let contributions: Vec<(String, Datum)> = match result {
                Datum::Record(fields) => fields
                    .into_iter()
                    .map(|(field, c)| {
                        let out_name = match &ne.name {
                            NameSpec::Auto => field,
                            _ => format!("{name}_{field}"),
                        };
                        (out_name, Datum::Vector(c))
                    })
                    .collect(),
                other => vec![(name.clone(), other)],
            };

            for (out_name, datum) in contributions {
                let len = datum.len();
                if len != 1 && len != group_rows {
                    return Err(CurlewError::LengthMismatch {
                        group_key: desc.display_key(key_names),
                        expression: label.clone(),
                        ordinal,
                        actual: len,
                        expected: group_rows,
                    });
                }

                mask.bind(&out_name, datum.clone())
                    .map_err(|e| with_group_context(e, desc, key_names, ordinal, &label))?;

                let idx = match buffers.iter().position(|(n, _)| *n == out_name) {
                    Some(idx) => idx,
                    None => {
                        buffers.push((out_name.clone(), vec![Value::Null; total_rows]));
                        buffers.len() - 1
                    }
                };
                let buffer = &mut buffers[idx].1;
                for (j, &row) in desc.rows.iter().enumerate() {
                    let idx = if len == 1 { 0 } else { j };
                    buffer[row] = datum.value_at(idx).unwrap_or(Value::Null);
                }
            }
        }
    }

    // Input columns in order (replaced where overwritten), then new columns.
    let mut out: Vec<(String, ColumnVec)> = Vec::with_capacity(
        table.num_columns() + buffers.len(),
    );
    for field in table.fields() {
        match buffers.iter().position(|(n, _)| *n == field.name) {
            Some(idx) => {
                let (name, buffer) = buffers.remove(idx);
                out.push((name, ColumnVec::from_values(buffer)?));
            }
            None => {
                let column = table
                    .column_by_name(&field.name)
                    .expect("field names match columns");
                out.push((field.name.clone(), (**column).clone()));
            }
        }
    }
    for (name, buffer) in buffers {
        out.push((name, ColumnVec::from_values(buffer)?));
    }

    Table::try_new(out)?.with_grouping(table.grouping().clone())
}

/// Keep the rows where every predicate is true, evaluated per group.
///
/// A null predicate value drops the row. Output rows keep the table's
/// original order and grouping metadata.
pub fn filter_rows(table: &Table, predicates: &[Arg], ctx: &EvalContext<'_>) -> Result<Table> {
    let grouped = GroupedTable::from_table(table, GroupOrder::FirstAppearance)?;
    let key_names = grouped.key_names();

    let mut kept: Vec<usize> = Vec::new();
    for desc in grouped.groups() {
        let group_rows = desc.rows.len();
        let mask = Mask::build(table, Some(desc), ctx.scopes.global())?;
        let mut keep = vec![true; group_rows];

        for (ordinal, predicate) in predicates.iter().enumerate() {
            let label = predicate.label();
            let result = match predicate {
                Arg::Captured(capture) => capture.force(&mask, ctx),
                Arg::Evaluated(datum) => Ok(datum.clone()),
            }
            .map_err(|e| with_group_context(e, desc, key_names, ordinal, &label))?;

            let len = result.len();
            if len != 1 && len != group_rows {
                return Err(CurlewError::LengthMismatch {
                    group_key: desc.display_key(key_names),
                    expression: label.clone(),
                    ordinal,
                    actual: len,
                    expected: group_rows,
                });
            }
            for (j, flag) in keep.iter_mut().enumerate() {
                let idx = if len == 1 { 0 } else { j };
                let passed = match result.value_at(idx) {
                    Some(Value::Bool(b)) => b,
                    Some(Value::Null) | None => false,
                    Some(other) => {
                        return Err(with_group_context(
                            CurlewError::compute(format!(
                                "filter predicate must be bool, got {}",
                                other.value_type()
                            )),
                            desc,
                            key_names,
                            ordinal,
                            &label,
                        ))
                    }
                };
                *flag &= passed;
            }
        }

        kept.extend(
            desc.rows
                .iter()
                .zip(keep.iter())
                .filter(|&(_, &k)| k)
                .map(|(&row, _)| row),
        );
    }

    kept.sort_unstable();
    table.take_rows(&kept)
}

/// Apply named primitives over a selection of columns.
///
/// Expansion happens against column metadata before any evaluation, in the
/// table's column order. Output names come from the template, with `{col}`
/// bound to the column name and `{fn}` to the function name; the default is
/// `{col}` for a single function and `{col}_{fn}` otherwise.
#[derive(Debug, Clone)]
pub struct Across {
    pub selector: Selector,
    pub functions: Vec<String>,
    pub template: Option<NameTemplate>,
}

impl Across {
    pub fn new<S: Into<String>>(
        selector: Selector,
        functions: impl IntoIterator<Item = S>,
    ) -> Across {
        Across {
            selector,
            functions: functions.into_iter().map(Into::into).collect(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: &str) -> Result<Across> {
        self.template = Some(NameTemplate::parse(template)?);
        Ok(self)
    }
}

/// Expand an across spec into one named expression per (column, function)
/// pair, ready for [`mutate`] or [`summarize`](super::summarize).
pub fn expand_across(
    source: &dyn TableAccess,
    across: &Across,
    scopes: &mut ScopeArena,
    parent: ScopeId,
) -> Result<Vec<NamedExpr>> {
    let spec = resolve(&across.selector, source)?;
    // Participating columns keep the table's own order.
    let mut positions = spec.positions().to_vec();
    positions.sort_unstable();

    let template = match &across.template {
        Some(template) => template.clone(),
        None if across.functions.len() <= 1 => NameTemplate::parse("{col}")?,
        None => NameTemplate::parse("{col}_{fn}")?,
    };

    let mut out = Vec::with_capacity(positions.len() * across.functions.len());
    for &pos in &positions {
        let column = &source.fields()[pos].name;
        for function in &across.functions {
            let scope = scopes.child(parent);
            scopes.bind(scope, "col", Value::from(column.clone()));
            scopes.bind(scope, "fn", Value::from(function.clone()));
            let name = template.render(&TemplateEnv {
                scopes,
                scope,
                args: &[],
            })?;
            let capture = CapturedExpr::capture(call(function.clone(), [col(column.clone())]), scope);
            out.push(NamedExpr::named(name, capture));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{group_by, summarize, ReduceOptions};
    use crate::expr::lit;
    use crate::testutil;

    fn ctx<'a>(
        scopes: &'a ScopeArena,
        functions: &'a crate::functions::FunctionRegistry,
    ) -> EvalContext<'a> {
        EvalContext { scopes, functions }
    }

    #[test]
    fn mutate_scatters_group_results_into_row_order() {
        let scopes = ScopeArena::new();
        let functions = testutil::registry();
        let ctx = ctx(&scopes, &functions);
        let table = group_by(&testutil::sample_table(), &["g"]).unwrap();

        let out = mutate(
            &table,
            &[NamedExpr::named(
                "centered",
                CapturedExpr::capture(col("x").sub(call("mean", [col("x")])), scopes.global()),
            )],
            &ctx,
        )
        .unwrap();

        // Group means: a -> 1.5, b -> 4.0. Row order is the source order.
        assert_eq!(
            **out.column_by_name("centered").unwrap(),
            ColumnVec::float64s(&[-0.5, 0.5, -1.0, 0.0, 1.0])
        );
        assert_eq!(out.grouping(), table.grouping());
        assert_eq!(out.num_rows(), 5);
    }

    #[test]
    fn mutate_overwrites_in_place_without_touching_the_source() {
        let scopes = ScopeArena::new();
        let functions = testutil::registry();
        let ctx = ctx(&scopes, &functions);
        let table = testutil::sample_table();

        let out = mutate(
            &table,
            &[NamedExpr::named(
                "x",
                CapturedExpr::capture(col("x").mul(lit(10i64)), scopes.global()),
            )],
            &ctx,
        )
        .unwrap();

        // Position preserved.
        assert_eq!(out.position("x"), table.position("x"));
        assert_eq!(
            **out.column_by_name("x").unwrap(),
            ColumnVec::int64s(&[10, 20, 30, 40, 50])
        );
        assert_eq!(
            **table.column_by_name("x").unwrap(),
            ColumnVec::int64s(&[1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn mutate_length_mismatch_names_the_group() {
        let scopes = ScopeArena::new();
        let functions = testutil::registry();
        let ctx = ctx(&scopes, &functions);
        let table = group_by(&testutil::sample_table(), &["g"]).unwrap();

        let err = mutate(
            &table,
            &[NamedExpr::named(
                "bad",
                Arg::Evaluated(Datum::vector(ColumnVec::int64s(&[1, 2]))),
            )],
            &ctx,
        )
        .unwrap_err();

        match err {
            CurlewError::LengthMismatch { group_key, expected, .. } => {
                assert_eq!(group_key, "g = b");
                assert_eq!(expected, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn filter_keeps_matching_rows_in_source_order() {
        let scopes = ScopeArena::new();
        let functions = testutil::registry();
        let ctx = ctx(&scopes, &functions);
        let table = group_by(&testutil::sample_table(), &["g"]).unwrap();

        // Per group: keep rows above the group mean.
        let out = filter_rows(
            &table,
            &[Arg::Captured(CapturedExpr::capture(
                col("x").gt(call("mean", [col("x")])),
                scopes.global(),
            ))],
            &ctx,
        )
        .unwrap();

        assert_eq!(
            **out.column_by_name("x").unwrap(),
            ColumnVec::int64s(&[2, 5])
        );
        assert_eq!(out.grouping(), table.grouping());
    }

    #[test]
    fn filter_ands_multiple_predicates() {
        let scopes = ScopeArena::new();
        let functions = testutil::registry();
        let ctx = ctx(&scopes, &functions);
        let table = testutil::sample_table();

        let out = filter_rows(
            &table,
            &[
                Arg::Captured(CapturedExpr::capture(col("x").gt(lit(1i64)), scopes.global())),
                Arg::Captured(CapturedExpr::capture(col("x").lt(lit(5i64)), scopes.global())),
            ],
            &ctx,
        )
        .unwrap();

        assert_eq!(
            **out.column_by_name("x").unwrap(),
            ColumnVec::int64s(&[2, 3, 4])
        );
    }

    #[test]
    fn across_expands_in_table_order_with_templated_names() {
        let mut scopes = ScopeArena::new();
        let functions = testutil::registry();
        let table = group_by(&testutil::sample_table(), &["g"]).unwrap();

        let across = Across::new(
            // Mention order y-then-x; expansion still follows table order.
            Selector::named(["y", "x"]),
            ["mean", "sum"],
        );
        let global = scopes.global();
        let exprs = expand_across(&table, &across, &mut scopes, global).unwrap();
        let names: Vec<String> = exprs
            .iter()
            .map(|e| e.resolve_name(&scopes).unwrap())
            .collect();
        assert_eq!(names, vec!["x_mean", "x_sum", "y_mean", "y_sum"]);

        let ctx = EvalContext {
            scopes: &scopes,
            functions: &functions,
        };
        let out = summarize(&table, &exprs, &ctx, &ReduceOptions::default()).unwrap();
        assert_eq!(
            **out.column_by_name("x_mean").unwrap(),
            ColumnVec::float64s(&[1.5, 4.0])
        );
        assert_eq!(
            **out.column_by_name("y_sum").unwrap(),
            ColumnVec::float64s(&[2.0, 10.5])
        );
    }
}
