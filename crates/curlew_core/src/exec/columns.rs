//! Metadata-only column verbs: selection, renaming, relocation.

use crate::errors::{CurlewError, Result};
use crate::select::{resolve, SelectionSpec, Selector};
use crate::table::{Grouping, Table};

/// Project columns in resolved selection order. Grouping keys missing from
/// the selection are re-added at the front so the grouping stays valid.
pub fn select_columns(table: &Table, selector: &Selector) -> Result<Table> {
    let spec = resolve(selector, table)?;

    let mut positions: Vec<usize> = Vec::new();
    for key in table.grouping().key_names() {
        let pos = table.position(key).expect("grouping keys exist");
        if !spec.contains(pos) {
            tracing::debug!(key = %key, "re-adding grouping key dropped by selection");
            positions.push(pos);
        }
    }
    positions.extend(spec.positions().iter().copied());

    table.project(&SelectionSpec::from_positions(positions))
}

/// Rename columns via `(new_name, old_name)` pairs. Old names must exist;
/// grouping keys follow their columns to the new names.
pub fn rename(table: &Table, pairs: &[(&str, &str)]) -> Result<Table> {
    let rename_of = |name: &str| -> Option<&str> {
        pairs
            .iter()
            .find(|(_, old)| *old == name)
            .map(|(new, _)| *new)
    };

    for (_, old) in pairs {
        if table.position(old).is_none() {
            return Err(CurlewError::Selection {
                selector: format!("rename of `{old}`"),
                reason: "no such column".to_string(),
                available: table.column_names().map(String::from).collect(),
            });
        }
    }

    let columns = table.fields().iter().map(|field| {
        let name = rename_of(&field.name).unwrap_or(&field.name).to_string();
        let column = table
            .column_by_name(&field.name)
            .expect("field names match columns")
            .clone();
        (name, column)
    });
    let out = Table::from_arc_columns(columns)?;

    let grouping = match table.grouping() {
        Grouping::Keys(keys) => Grouping::Keys(
            keys.iter()
                .map(|key| rename_of(key).unwrap_or(key).to_string())
                .collect(),
        ),
        other => other.clone(),
    };
    out.with_grouping(grouping)
}

/// Where relocated columns land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateTo {
    First,
    Last,
    Before(String),
    After(String),
}

/// Move the selected columns (in resolved order) to a new position, leaving
/// the remaining columns in their original order.
pub fn relocate(table: &Table, selector: &Selector, to: &RelocateTo) -> Result<Table> {
    let moved = resolve(selector, table)?;
    let rest: Vec<usize> = (0..table.num_columns())
        .filter(|idx| !moved.contains(*idx))
        .collect();

    let anchor = |name: &String| -> Result<usize> {
        let pos = table.position(name).ok_or_else(|| CurlewError::Selection {
            selector: format!("relocate anchor `{name}`"),
            reason: "no such column".to_string(),
            available: table.column_names().map(String::from).collect(),
        })?;
        if moved.contains(pos) {
            return Err(CurlewError::Selection {
                selector: format!("relocate anchor `{name}`"),
                reason: "anchor is part of the moved selection".to_string(),
                available: table.column_names().map(String::from).collect(),
            });
        }
        Ok(rest
            .iter()
            .position(|&idx| idx == pos)
            .expect("anchor is in the remainder"))
    };

    let insert_at = match to {
        RelocateTo::First => 0,
        RelocateTo::Last => rest.len(),
        RelocateTo::Before(name) => anchor(name)?,
        RelocateTo::After(name) => anchor(name)? + 1,
    };

    let mut positions: Vec<usize> = Vec::with_capacity(table.num_columns());
    positions.extend(&rest[..insert_at]);
    positions.extend(moved.positions());
    positions.extend(&rest[insert_at..]);

    table.project(&SelectionSpec::from_positions(positions))
}
