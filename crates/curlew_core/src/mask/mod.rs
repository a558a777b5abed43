//! Layered name-resolution contexts.
//!
//! A mask is built for one (table, group) pair and consulted for every free
//! name in an expression. Layers, in decreasing precedence:
//!
//! 1. explicit pronoun access (column layers only, scope chain never
//!    consulted),
//! 2. group-local columns (the group's slice of each table column),
//! 3. within-call bindings (results of earlier expressions in the same verb
//!    call),
//! 4. the owning scope chain.
//!
//! Data-variables therefore shadow env-variables for unqualified names.
//! Rebinding a name that exists as a column replaces the column binding for
//! the rest of the call; the source table itself is never touched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;

use crate::errors::{CurlewError, Result};
use crate::scope::{ScopeArena, ScopeId};
use crate::table::{GroupDescriptor, TableAccess};
use crate::values::Datum;

/// The reserved pronoun granting explicit access to data-variables.
pub const PRONOUN: &str = ".data";

const UNQUALIFIED_LAYERS: &str = "group columns, within-call bindings, scope chain";
const PRONOUN_LAYERS: &str = "group columns, within-call bindings (pronoun access never consults the scope chain)";

static NEXT_MASK_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one mask instance. Capture memoization is keyed on this, so
/// per-group masks never share cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskId(u64);

/// A resolution context for one group of one table.
#[derive(Debug)]
pub struct Mask {
    id: MaskId,
    rows: usize,
    owner_scope: ScopeId,
    columns: Vec<(String, Datum)>,
    column_index: HashMap<String, usize, RandomState>,
    locals: Vec<(String, Datum)>,
    local_index: HashMap<String, usize, RandomState>,
}

impl Mask {
    /// Assemble a mask for `group` of `source` (or the whole table when
    /// `group` is `None`). Column data is materialized through the backend
    /// capability interface and sliced to the group's rows.
    pub fn build(
        source: &dyn TableAccess,
        group: Option<&GroupDescriptor>,
        owner_scope: ScopeId,
    ) -> Result<Mask> {
        let rows = match group {
            Some(g) => g.rows.len(),
            None => source.num_rows(),
        };

        let mut columns = Vec::with_capacity(source.fields().len());
        let mut column_index = HashMap::default();
        for (idx, field) in source.fields().iter().enumerate() {
            if field.name == PRONOUN {
                return Err(CurlewError::unresolved(
                    PRONOUN,
                    "the pronoun name is reserved and cannot be a column",
                ));
            }
            let col = source.column(idx)?;
            let col = match group {
                Some(g) => std::sync::Arc::new(col.take(&g.rows)?),
                None => col,
            };
            column_index.insert(field.name.clone(), idx);
            columns.push((field.name.clone(), Datum::Vector(col)));
        }

        Ok(Mask {
            id: MaskId(NEXT_MASK_ID.fetch_add(1, Ordering::Relaxed)),
            rows,
            owner_scope,
            columns,
            column_index,
            locals: Vec::new(),
            local_index: HashMap::default(),
        })
    }

    pub fn id(&self) -> MaskId {
        self.id
    }

    /// Row count of the block this mask resolves against.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn owner_scope(&self) -> ScopeId {
        self.owner_scope
    }

    /// Resolve an unqualified name: columns, then within-call bindings, then
    /// the scope chain rooted at `ambient`.
    pub fn lookup(&self, name: &str, ambient: ScopeId, scopes: &ScopeArena) -> Result<Datum> {
        if name == PRONOUN {
            return Err(CurlewError::unresolved(
                name,
                "the pronoun is not a value; qualify an access with it instead",
            ));
        }
        if let Some(value) = self.lookup_column_layers(name) {
            return Ok(value);
        }
        if let Some(value) = scopes.lookup(ambient, name) {
            return Ok(value.clone());
        }
        Err(CurlewError::unresolved(name, UNQUALIFIED_LAYERS))
    }

    /// Resolve a pronoun-qualified name: column layers only. This is the
    /// supported path for using a runtime string as a column reference.
    pub fn lookup_data(&self, name: &str) -> Result<Datum> {
        self.lookup_column_layers(name)
            .ok_or_else(|| CurlewError::unresolved(name, PRONOUN_LAYERS))
    }

    fn lookup_column_layers(&self, name: &str) -> Option<Datum> {
        if let Some(&idx) = self.column_index.get(name) {
            return Some(self.columns[idx].1.clone());
        }
        if let Some(&idx) = self.local_index.get(name) {
            return Some(self.locals[idx].1.clone());
        }
        None
    }

    /// Whether `name` currently resolves in the column layers.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name) || self.local_index.contains_key(name)
    }

    /// Make an expression result visible to subsequent expressions in the
    /// same call. A name that exists as a group-local column is replaced in
    /// place (shadowing the data column for the rest of the call); otherwise
    /// the binding lands in the within-call layer.
    pub fn bind(&mut self, name: &str, value: Datum) -> Result<()> {
        if name == PRONOUN {
            return Err(CurlewError::unresolved(
                name,
                "the pronoun name is reserved and cannot be bound",
            ));
        }
        if let Some(&idx) = self.column_index.get(name) {
            self.columns[idx].1 = value;
            return Ok(());
        }
        match self.local_index.get(name) {
            Some(&idx) => self.locals[idx].1 = value,
            None => {
                self.local_index.insert(name.to_string(), self.locals.len());
                self.locals.push((name.to_string(), value));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::values::{ColumnVec, Value};

    fn scopes_and_table() -> (ScopeArena, Table) {
        let arena = ScopeArena::new();
        let table = Table::try_new([
            ("x".to_string(), ColumnVec::int64s(&[1, 2, 3])),
            ("y".to_string(), ColumnVec::int64s(&[4, 5, 6])),
        ])
        .unwrap();
        (arena, table)
    }

    #[test]
    fn columns_shadow_scope_bindings() {
        let (mut arena, table) = scopes_and_table();
        let caller = arena.child(arena.global());
        arena.bind(caller, "x", Value::Int64(99));

        let mask = Mask::build(&table, None, caller).unwrap();
        let got = mask.lookup("x", caller, &arena).unwrap();
        assert_eq!(got, Datum::Vector(table.column(0).unwrap().clone()));
    }

    #[test]
    fn scope_chain_is_the_last_layer() {
        let (mut arena, table) = scopes_and_table();
        let caller = arena.child(arena.global());
        arena.bind(caller, "threshold", Value::Int64(99));

        let mask = Mask::build(&table, None, caller).unwrap();
        let got = mask.lookup("threshold", caller, &arena).unwrap();
        assert_eq!(got, Datum::Scalar(Value::Int64(99)));
    }

    #[test]
    fn pronoun_lookup_skips_scope_chain() {
        let (mut arena, table) = scopes_and_table();
        let caller = arena.child(arena.global());
        arena.bind(caller, "threshold", Value::Int64(99));

        let mask = Mask::build(&table, None, caller).unwrap();
        let err = mask.lookup_data("threshold").unwrap_err();
        assert!(matches!(err, CurlewError::MaskResolution { .. }));
        assert!(err.to_string().contains("scope chain"));
    }

    #[test]
    fn rebinding_a_column_replaces_it_for_the_call() {
        let (arena, table) = scopes_and_table();
        let mut mask = Mask::build(&table, None, arena.global()).unwrap();

        mask.bind("x", Datum::Scalar(Value::Int64(42))).unwrap();
        let got = mask.lookup("x", arena.global(), &arena).unwrap();
        assert_eq!(got, Datum::Scalar(Value::Int64(42)));

        // Source table unchanged.
        assert_eq!(
            table.column(0).unwrap().value(0),
            Some(Value::Int64(1))
        );
    }

    #[test]
    fn pronoun_name_cannot_be_bound() {
        let (arena, table) = scopes_and_table();
        let mut mask = Mask::build(&table, None, arena.global()).unwrap();
        let err = mask
            .bind(PRONOUN, Datum::Scalar(Value::Int64(1)))
            .unwrap_err();
        assert!(matches!(err, CurlewError::MaskResolution { .. }));
    }

    #[test]
    fn group_slices_are_group_local() {
        let (arena, table) = scopes_and_table();
        let group = GroupDescriptor {
            key: vec![Value::Int64(0)],
            rows: vec![0, 2],
        };
        let mask = Mask::build(&table, Some(&group), arena.global()).unwrap();
        assert_eq!(mask.rows(), 2);
        let got = mask.lookup_data("x").unwrap();
        assert_eq!(got, Datum::vector(ColumnVec::int64s(&[1, 3])));
    }

    #[test]
    fn masks_have_distinct_ids() {
        let (arena, table) = scopes_and_table();
        let a = Mask::build(&table, None, arena.global()).unwrap();
        let b = Mask::build(&table, None, arena.global()).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
