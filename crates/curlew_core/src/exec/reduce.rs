//! The grouped reduction protocol.
//!
//! For each group, in group order: build a mask, force the expressions in
//! written order (each result becomes a within-call binding visible to the
//! expressions after it), check result lengths, unpack records, prefix the
//! block with the group's key values, then concatenate blocks and decide the
//! output's grouping metadata.

use std::sync::Arc;

use crate::capture::Arg;
use crate::errors::{CurlewError, Result};
use crate::expr::evaluator::EvalContext;
use crate::mask::Mask;
use crate::table::{GroupDescriptor, GroupOrder, GroupedTable, Grouping, Table};
use crate::template::NameSpec;
use crate::values::{ColumnVec, Datum};

use super::options::{GroupPolicy, ReduceOptions};
use super::NamedExpr;

struct Block {
    rows: usize,
    columns: Vec<(String, Arc<ColumnVec>)>,
}

pub(crate) fn with_group_context(
    err: CurlewError,
    desc: &GroupDescriptor,
    key_names: &[String],
    ordinal: usize,
    label: &str,
) -> CurlewError {
    match err {
        // These already carry group context.
        e @ CurlewError::LengthMismatch { .. } | e @ CurlewError::GroupEval { .. } => e,
        e => CurlewError::GroupEval {
            group_key: desc.display_key(key_names),
            ordinal,
            expression: label.to_string(),
            source: Box::new(e),
        },
    }
}

fn eval_group(
    grouped: &GroupedTable,
    desc: &GroupDescriptor,
    exprs: &[NamedExpr],
    names: &[String],
    ctx: &EvalContext<'_>,
) -> Result<Block> {
    let key_names = grouped.key_names();
    let mut mask = Mask::build(grouped.table(), Some(desc), ctx.scopes.global())?;

    let mut out: Vec<(String, Datum)> = Vec::new();
    let mut block_rows: Option<usize> = None;

    for (ordinal, (ne, name)) in exprs.iter().zip(names).enumerate() {
        let label = ne.arg.label();
        let result = match &ne.arg {
            Arg::Captured(capture) => capture.force(&mask, ctx),
            Arg::Evaluated(datum) => Ok(datum.clone()),
        }
        .map_err(|e| with_group_context(e, desc, key_names, ordinal, &label))?;

        // A record unpacks into one output column per field; the declared
        // name becomes a prefix unless the expression was auto-named.
        let contributions: Vec<(String, Datum)> = match result {
            Datum::Record(fields) => fields
                .into_iter()
                .map(|(field, col)| {
                    let out_name = match &ne.name {
                        NameSpec::Auto => field,
                        _ => format!("{name}_{field}"),
                    };
                    (out_name, Datum::Vector(col))
                })
                .collect(),
            other => vec![(name.clone(), other)],
        };

        for (out_name, datum) in contributions {
            let len = datum.len();
            if len != 1 {
                match block_rows {
                    None => block_rows = Some(len),
                    Some(expected) if expected != len => {
                        return Err(CurlewError::LengthMismatch {
                            group_key: desc.display_key(key_names),
                            expression: label.clone(),
                            ordinal,
                            actual: len,
                            expected,
                        })
                    }
                    Some(_) => {}
                }
            }

            mask.bind(&out_name, datum.clone())
                .map_err(|e| with_group_context(e, desc, key_names, ordinal, &label))?;

            // Rebinding an earlier output keeps its original position.
            match out.iter_mut().find(|(existing, _)| existing == &out_name) {
                Some(slot) => slot.1 = datum,
                None => out.push((out_name, datum)),
            }
        }
    }

    let rows = block_rows.unwrap_or(1);
    let mut columns = Vec::with_capacity(key_names.len() + out.len());
    for (key_name, key_value) in key_names.iter().zip(desc.key.iter()) {
        columns.push((key_name.clone(), Arc::new(key_value.repeat(rows))));
    }
    for (ordinal, (name, datum)) in out.into_iter().enumerate() {
        let col = datum
            .into_column(rows)
            .map_err(|e| with_group_context(e, desc, key_names, ordinal, &name))?;
        columns.push((name, col));
    }

    Ok(Block { rows, columns })
}

/// Reduce a partitioned table: one output block per group, concatenated in
/// group order. Any per-group failure aborts the whole call.
pub fn reduce(
    grouped: &GroupedTable,
    exprs: &[NamedExpr],
    ctx: &EvalContext<'_>,
    opts: &ReduceOptions,
) -> Result<Table> {
    let key_names = grouped.key_names();

    // Output names are resolved once, before any group runs, so they are
    // stable across groups.
    let names = exprs
        .iter()
        .map(|e| e.resolve_name(ctx.scopes))
        .collect::<Result<Vec<_>>>()?;

    // Reassigning a grouping key mid-call is reserved behavior.
    for name in &names {
        if key_names.contains(name) {
            return Err(CurlewError::compute(format!(
                "cannot rebind grouping key `{name}` inside a reduction"
            )));
        }
    }

    let mut blocks = Vec::with_capacity(grouped.num_groups());
    let mut single_rows = true;
    for desc in grouped.groups() {
        let block = eval_group(grouped, desc, exprs, &names, ctx)?;
        single_rows &= block.rows == 1;
        blocks.push(block);
    }

    let mut assembled: Vec<(String, ColumnVec)> = Vec::new();
    match blocks.split_first() {
        None => {
            // No groups (empty grouped input): emit an empty, correctly
            // shaped table.
            for key in key_names {
                let ty = grouped
                    .table()
                    .position(key)
                    .and_then(|idx| grouped.table().fields().get(idx))
                    .map(|f| f.value_type)
                    .unwrap_or(crate::values::ValueType::Null);
                assembled.push((key.clone(), ColumnVec::with_capacity(ty, 0)));
            }
            for name in &names {
                assembled.push((name.clone(), ColumnVec::Null(0)));
            }
        }
        Some((first, rest)) => {
            for (name, col) in &first.columns {
                assembled.push((name.clone(), (**col).clone()));
            }
            for block in rest {
                if block.columns.len() != assembled.len()
                    || block
                        .columns
                        .iter()
                        .zip(assembled.iter())
                        .any(|((a, _), (b, _))| a != b)
                {
                    return Err(CurlewError::compute(
                        "groups produced inconsistent output columns",
                    ));
                }
                for ((_, col), (_, out)) in block.columns.iter().zip(assembled.iter_mut()) {
                    out.try_append((**col).clone())?;
                }
            }
        }
    }

    let policy = match opts.policy {
        Some(policy) => policy,
        None => {
            let inferred = if single_rows {
                GroupPolicy::DropLast
            } else {
                GroupPolicy::Keep
            };
            if grouped.is_grouped() && !opts.quiet {
                tracing::info!(
                    keys = ?key_names,
                    policy = %inferred,
                    "inferred output grouping for reduction; pass an explicit policy to override"
                );
            }
            inferred
        }
    };
    let grouping = match policy {
        GroupPolicy::Drop => Grouping::None,
        GroupPolicy::Rowwise => Grouping::Rowwise,
        GroupPolicy::Keep => {
            if key_names.is_empty() {
                Grouping::None
            } else {
                Grouping::Keys(key_names.to_vec())
            }
        }
        GroupPolicy::DropLast => {
            let kept = &key_names[..key_names.len().saturating_sub(1)];
            if kept.is_empty() {
                Grouping::None
            } else {
                Grouping::Keys(kept.to_vec())
            }
        }
    };

    Table::try_new(assembled)?.with_grouping(grouping)
}

/// Partition `table` along its grouping metadata, then reduce.
pub fn summarize(
    table: &Table,
    exprs: &[NamedExpr],
    ctx: &EvalContext<'_>,
    opts: &ReduceOptions,
) -> Result<Table> {
    let grouped = GroupedTable::from_table(table, GroupOrder::FirstAppearance)?;
    reduce(&grouped, exprs, ctx, opts)
}
