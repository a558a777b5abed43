//! Tables: ordered named columns plus grouping metadata.

pub mod access;
pub mod group;

pub use access::{RowSliceView, TableAccess};
pub use group::{partition, GroupDescriptor, GroupOrder, GroupedTable};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CurlewError, Result};
use crate::select::SelectionSpec;
use crate::values::{ColumnVec, ValueType};

/// Column descriptor: name and element type. Ordinal position is the index
/// in the table's field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value_type: ValueType,
}

impl Field {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Field {
        Field {
            name: name.into(),
            value_type,
        }
    }
}

/// Grouping metadata attached to a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Grouping {
    #[default]
    None,
    /// Grouped by the named key columns, in order.
    Keys(Vec<String>),
    /// Every row is its own group.
    Rowwise,
}

impl Grouping {
    pub fn key_names(&self) -> &[String] {
        match self {
            Grouping::Keys(keys) => keys,
            _ => &[],
        }
    }

    pub fn is_grouped(&self) -> bool {
        !matches!(self, Grouping::None)
    }
}

/// An immutable, column-oriented table.
///
/// Columns are shared behind `Arc`; verbs build new tables rather than
/// mutating their input.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    fields: Vec<Field>,
    columns: Vec<Arc<ColumnVec>>,
    grouping: Grouping,
}

impl Table {
    /// Build a table from named columns. Names must be unique and columns
    /// must have equal lengths.
    pub fn try_new(columns: impl IntoIterator<Item = (String, ColumnVec)>) -> Result<Table> {
        let mut fields = Vec::new();
        let mut cols: Vec<Arc<ColumnVec>> = Vec::new();
        for (name, col) in columns {
            if fields.iter().any(|f: &Field| f.name == name) {
                return Err(CurlewError::compute(format!(
                    "duplicate column name `{name}`"
                )));
            }
            if let Some(first) = cols.first() {
                if first.len() != col.len() {
                    return Err(CurlewError::compute(format!(
                        "column `{name}` has length {}, expected {}",
                        col.len(),
                        first.len()
                    )));
                }
            }
            fields.push(Field::new(name, col.value_type()));
            cols.push(Arc::new(col));
        }
        Ok(Table {
            fields,
            columns: cols,
            grouping: Grouping::None,
        })
    }

    /// Like [`Table::try_new`] but for columns already behind `Arc`.
    pub fn from_arc_columns(
        columns: impl IntoIterator<Item = (String, Arc<ColumnVec>)>,
    ) -> Result<Table> {
        let mut fields = Vec::new();
        let mut cols: Vec<Arc<ColumnVec>> = Vec::new();
        for (name, col) in columns {
            if fields.iter().any(|f: &Field| f.name == name) {
                return Err(CurlewError::compute(format!(
                    "duplicate column name `{name}`"
                )));
            }
            if let Some(first) = cols.first() {
                if first.len() != col.len() {
                    return Err(CurlewError::compute(format!(
                        "column `{name}` has length {}, expected {}",
                        col.len(),
                        first.len()
                    )));
                }
            }
            fields.push(Field::new(name, col.value_type()));
            cols.push(col);
        }
        Ok(Table {
            fields,
            columns: cols,
            grouping: Grouping::None,
        })
    }

    pub fn empty() -> Table {
        Table {
            fields: Vec::new(),
            columns: Vec::new(),
            grouping: Grouping::None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub fn column(&self, idx: usize) -> Option<&Arc<ColumnVec>> {
        self.columns.get(idx)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Arc<ColumnVec>> {
        self.position(name).and_then(|idx| self.column(idx))
    }

    /// Replace the grouping metadata, validating that key columns exist.
    pub fn with_grouping(mut self, grouping: Grouping) -> Result<Table> {
        if let Grouping::Keys(keys) = &grouping {
            for key in keys {
                if self.position(key).is_none() {
                    return Err(CurlewError::Selection {
                        selector: format!("group key `{key}`"),
                        reason: "no such column".to_string(),
                        available: self.column_names().map(String::from).collect(),
                    });
                }
            }
        }
        self.grouping = grouping;
        Ok(self)
    }

    /// Project columns in the order given by a resolved selection. Grouping
    /// keys not covered by the selection are dropped from the metadata.
    pub fn project(&self, spec: &SelectionSpec) -> Result<Table> {
        let mut out = Vec::with_capacity(spec.len());
        for &idx in spec.positions() {
            let field = self.fields.get(idx).ok_or_else(|| {
                CurlewError::compute(format!("projection index {idx} out of bounds"))
            })?;
            out.push((field.name.clone(), self.columns[idx].clone()));
        }
        let table = Table::from_arc_columns(out)?;
        let grouping = match &self.grouping {
            Grouping::Keys(keys) => {
                let kept: Vec<String> = keys
                    .iter()
                    .filter(|k| table.position(k).is_some())
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    Grouping::None
                } else {
                    Grouping::Keys(kept)
                }
            }
            other => other.clone(),
        };
        table.with_grouping(grouping)
    }

    /// New table containing the given rows, in order. Grouping metadata is
    /// preserved.
    pub fn take_rows(&self, rows: &[usize]) -> Result<Table> {
        let mut out = Vec::with_capacity(self.num_columns());
        for (field, col) in self.fields.iter().zip(self.columns.iter()) {
            out.push((field.name.clone(), col.take(rows)?));
        }
        let table = Table::try_new(out)?;
        table.with_grouping(self.grouping.clone())
    }
}
