//! The backend capability interface.
//!
//! Masks, selection, and the reduction engine see tables only through
//! [`TableAccess`]: enumerate column metadata, report rows, materialize a
//! column. [`Table`] is the in-memory backend; [`RowSliceView`] is the view a
//! group evaluation runs against. A deferred backend would implement the same
//! trait and translate materialization instead.

use std::sync::Arc;

use super::{Field, Table};
use crate::errors::{CurlewError, Result};
use crate::values::ColumnVec;

pub trait TableAccess {
    /// Column metadata, in table order.
    fn fields(&self) -> &[Field];

    fn num_rows(&self) -> usize;

    /// Materialize the column at `idx`.
    fn column(&self, idx: usize) -> Result<Arc<ColumnVec>>;

    fn position(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    fn column_names(&self) -> Vec<String> {
        self.fields().iter().map(|f| f.name.clone()).collect()
    }
}

impl TableAccess for Table {
    fn fields(&self) -> &[Field] {
        Table::fields(self)
    }

    fn num_rows(&self) -> usize {
        Table::num_rows(self)
    }

    fn column(&self, idx: usize) -> Result<Arc<ColumnVec>> {
        Table::column(self, idx).cloned().ok_or_else(|| {
            CurlewError::compute(format!("column index {idx} out of bounds"))
        })
    }
}

/// A row-subset view over a base table, materializing sliced columns on
/// demand. Used for per-group evaluation contexts.
#[derive(Debug, Clone, Copy)]
pub struct RowSliceView<'a> {
    base: &'a Table,
    rows: &'a [usize],
}

impl<'a> RowSliceView<'a> {
    pub fn new(base: &'a Table, rows: &'a [usize]) -> RowSliceView<'a> {
        RowSliceView { base, rows }
    }
}

impl TableAccess for RowSliceView<'_> {
    fn fields(&self) -> &[Field] {
        self.base.fields()
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn column(&self, idx: usize) -> Result<Arc<ColumnVec>> {
        let col = Table::column(self.base, idx).ok_or_else(|| {
            CurlewError::compute(format!("column index {idx} out of bounds"))
        })?;
        Ok(Arc::new(col.take(self.rows)?))
    }
}
