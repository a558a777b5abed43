//! Partitioning a table into groups.

use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use super::{Grouping, Table};
use crate::errors::{CurlewError, Result};
use crate::values::Value;

/// Ordering of groups in a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupOrder {
    /// Groups appear in order of first appearance of their key combination.
    #[default]
    FirstAppearance,
    /// Groups sorted by key values (total order, nulls first).
    Sorted,
}

/// One group: its key values (parallel to the grouped table's key names) and
/// the row indices belonging to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDescriptor {
    pub key: Vec<Value>,
    pub rows: Vec<usize>,
}

impl GroupDescriptor {
    /// Render `k1 = v1, k2 = v2` for notices and error context.
    pub fn display_key(&self, names: &[String]) -> String {
        if self.key.is_empty() {
            return "<ungrouped>".to_string();
        }
        names
            .iter()
            .zip(self.key.iter())
            .map(|(name, value)| format!("{name} = {}", value.render()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A table plus its computed partition.
///
/// The descriptors exactly partition the table's rows: every row index
/// appears in exactly one group.
#[derive(Debug, Clone)]
pub struct GroupedTable {
    table: Table,
    keys: Vec<String>,
    groups: Vec<GroupDescriptor>,
}

impl GroupedTable {
    /// Partition using the table's own grouping metadata. An ungrouped table
    /// becomes a single all-rows group; a rowwise table gets one singleton
    /// group per row.
    pub fn from_table(table: &Table, order: GroupOrder) -> Result<GroupedTable> {
        match table.grouping().clone() {
            Grouping::None => Ok(GroupedTable {
                table: table.clone(),
                keys: Vec::new(),
                groups: vec![GroupDescriptor {
                    key: Vec::new(),
                    rows: (0..table.num_rows()).collect(),
                }],
            }),
            Grouping::Rowwise => Ok(GroupedTable {
                table: table.clone(),
                keys: Vec::new(),
                groups: (0..table.num_rows())
                    .map(|row| GroupDescriptor {
                        key: Vec::new(),
                        rows: vec![row],
                    })
                    .collect(),
            }),
            Grouping::Keys(keys) => {
                let keys: Vec<&str> = keys.iter().map(|s| s.as_str()).collect();
                partition(table, &keys, order)
            }
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key_names(&self) -> &[String] {
        &self.keys
    }

    pub fn groups(&self) -> &[GroupDescriptor] {
        &self.groups
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Whether the source table carried any grouping structure.
    pub fn is_grouped(&self) -> bool {
        self.table.grouping().is_grouped()
    }
}

/// Compute the distinct key combinations of `keys` and build one group per
/// combination. Exhaustive and disjoint by construction.
pub fn partition(table: &Table, keys: &[&str], order: GroupOrder) -> Result<GroupedTable> {
    let mut positions = Vec::with_capacity(keys.len());
    for key in keys {
        let pos = table.position(key).ok_or_else(|| CurlewError::Selection {
            selector: format!("group key `{key}`"),
            reason: "no such column".to_string(),
            available: table.column_names().map(String::from).collect(),
        })?;
        positions.push(pos);
    }

    let mut groups: Vec<GroupDescriptor> = Vec::new();
    if positions.is_empty() {
        groups.push(GroupDescriptor {
            key: Vec::new(),
            rows: (0..table.num_rows()).collect(),
        });
    } else {
        let mut seen: HashMap<Vec<Value>, usize, RandomState> = HashMap::default();
        for row in 0..table.num_rows() {
            let key: Vec<Value> = positions
                .iter()
                .map(|&pos| {
                    table
                        .column(pos)
                        .and_then(|col| col.value(row))
                        .unwrap_or(Value::Null)
                })
                .collect();
            match seen.get(&key) {
                Some(&idx) => groups[idx].rows.push(row),
                None => {
                    seen.insert(key.clone(), groups.len());
                    groups.push(GroupDescriptor {
                        key,
                        rows: vec![row],
                    });
                }
            }
        }
        if order == GroupOrder::Sorted {
            groups.sort_by(|a, b| {
                a.key
                    .iter()
                    .zip(b.key.iter())
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }

    tracing::debug!(
        keys = ?keys,
        groups = groups.len(),
        rows = table.num_rows(),
        "partitioned table"
    );

    Ok(GroupedTable {
        table: table.clone(),
        keys: keys.iter().map(|s| s.to_string()).collect(),
        groups,
    })
}
