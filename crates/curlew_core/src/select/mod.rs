//! Metadata-only column selection.
//!
//! Selectors resolve against a table's column descriptors; only the
//! [`Selector::Where`] variant ever materializes column data. Resolution
//! yields an ordered, de-duplicated list of column positions.

use std::fmt;
use std::sync::Arc;

use crate::errors::{CurlewError, Result};
use crate::table::TableAccess;
use crate::values::{ColumnVec, ValueType};

/// The resolved output of a selection: ordered, de-duplicated positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSpec {
    positions: Vec<usize>,
}

impl SelectionSpec {
    /// Build directly from positions, de-duplicating while preserving first
    /// mention.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>) -> SelectionSpec {
        let mut out = Vec::new();
        for idx in positions {
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        SelectionSpec { positions: out }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.positions.contains(&idx)
    }
}

/// A predicate over a materialized column, with a label for error messages.
#[derive(Clone)]
pub struct ColumnPredicate {
    label: String,
    func: Arc<dyn Fn(&ColumnVec) -> bool + Send + Sync>,
}

impl ColumnPredicate {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(&ColumnVec) -> bool + Send + Sync + 'static,
    ) -> ColumnPredicate {
        ColumnPredicate {
            label: label.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for ColumnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnPredicate({})", self.label)
    }
}

#[derive(Debug, Clone)]
pub enum Selector {
    /// A single position (0-based).
    Index(usize),
    /// An inclusive position range.
    IndexRange(usize, usize),
    /// The last column.
    Last,
    /// Literal names; an absent name is an error.
    Named(Vec<String>),
    /// Literal names; absent names are silently dropped.
    AnyNamed(Vec<String>),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// Regex match over column names.
    Matches(String),
    /// Columns of the given element type.
    OfType(ValueType),
    /// Predicate over the materialized column. The only selector that reads
    /// column data.
    Where(ColumnPredicate),
    Union(Vec<Selector>),
    Intersect(Box<Selector>, Box<Selector>),
    /// Columns selected by the left but not the right selector.
    Difference(Box<Selector>, Box<Selector>),
    /// Complement over the full column set, in table order.
    Not(Box<Selector>),
    /// Every column, in table order.
    All,
}

impl Selector {
    pub fn named<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Selector {
        Selector::Named(names.into_iter().map(Into::into).collect())
    }

    pub fn any_named<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Selector {
        Selector::AnyNamed(names.into_iter().map(Into::into).collect())
    }

    pub fn union(self, other: Selector) -> Selector {
        match self {
            Selector::Union(mut list) => {
                list.push(other);
                Selector::Union(list)
            }
            first => Selector::Union(vec![first, other]),
        }
    }

    pub fn intersect(self, other: Selector) -> Selector {
        Selector::Intersect(Box::new(self), Box::new(other))
    }

    pub fn minus(self, other: Selector) -> Selector {
        Selector::Difference(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Selector {
        Selector::Not(Box::new(self))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Index(idx) => write!(f, "index {idx}"),
            Selector::IndexRange(a, b) => write!(f, "indexes {a}..={b}"),
            Selector::Last => write!(f, "last column"),
            Selector::Named(names) => write!(f, "columns [{}]", names.join(", ")),
            Selector::AnyNamed(names) => write!(f, "any of [{}]", names.join(", ")),
            Selector::StartsWith(p) => write!(f, "starts_with(\"{p}\")"),
            Selector::EndsWith(p) => write!(f, "ends_with(\"{p}\")"),
            Selector::Contains(p) => write!(f, "contains(\"{p}\")"),
            Selector::Matches(p) => write!(f, "matches(\"{p}\")"),
            Selector::OfType(ty) => write!(f, "of_type({ty})"),
            Selector::Where(pred) => write!(f, "where({})", pred.label),
            Selector::Union(_) => write!(f, "union"),
            Selector::Intersect(..) => write!(f, "intersection"),
            Selector::Difference(..) => write!(f, "difference"),
            Selector::Not(inner) => write!(f, "not({inner})"),
            Selector::All => write!(f, "all columns"),
        }
    }
}

/// Resolve a selector against `source`'s column descriptors.
pub fn resolve(selector: &Selector, source: &dyn TableAccess) -> Result<SelectionSpec> {
    let raw = resolve_inner(selector, source)?;
    let mut positions = Vec::with_capacity(raw.len());
    for idx in raw {
        if !positions.contains(&idx) {
            positions.push(idx);
        }
    }
    Ok(SelectionSpec { positions })
}

fn selection_error(selector: &Selector, reason: String, source: &dyn TableAccess) -> CurlewError {
    CurlewError::Selection {
        selector: selector.to_string(),
        reason,
        available: source.column_names(),
    }
}

fn resolve_inner(selector: &Selector, source: &dyn TableAccess) -> Result<Vec<usize>> {
    let num_columns = source.fields().len();
    let by_name = |name: &str| source.position(name);

    Ok(match selector {
        Selector::Index(idx) => {
            if *idx >= num_columns {
                return Err(selection_error(
                    selector,
                    format!("index {idx} out of bounds for {num_columns} columns"),
                    source,
                ));
            }
            vec![*idx]
        }
        Selector::IndexRange(start, end) => {
            if start > end || *end >= num_columns {
                return Err(selection_error(
                    selector,
                    format!("range invalid for {num_columns} columns"),
                    source,
                ));
            }
            (*start..=*end).collect()
        }
        Selector::Last => {
            if num_columns == 0 {
                return Err(selection_error(
                    selector,
                    "table has no columns".to_string(),
                    source,
                ));
            }
            vec![num_columns - 1]
        }
        Selector::Named(names) => {
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                match by_name(name) {
                    Some(idx) => out.push(idx),
                    None => {
                        return Err(selection_error(
                            selector,
                            format!("no column named `{name}`"),
                            source,
                        ))
                    }
                }
            }
            out
        }
        Selector::AnyNamed(names) => names.iter().filter_map(|name| by_name(name)).collect(),
        Selector::StartsWith(prefix) => metadata_match(source, |name| name.starts_with(prefix)),
        Selector::EndsWith(suffix) => metadata_match(source, |name| name.ends_with(suffix)),
        Selector::Contains(infix) => metadata_match(source, |name| name.contains(infix)),
        Selector::Matches(pattern) => {
            let re = regex::Regex::new(pattern).map_err(|e| {
                selection_error(selector, format!("invalid regex: {e}"), source)
            })?;
            metadata_match(source, |name| re.is_match(name))
        }
        Selector::OfType(ty) => source
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.value_type == *ty)
            .map(|(idx, _)| idx)
            .collect(),
        Selector::Where(pred) => {
            let mut out = Vec::new();
            for idx in 0..num_columns {
                let col = source.column(idx)?;
                if (pred.func)(&col) {
                    out.push(idx);
                }
            }
            out
        }
        Selector::Union(selectors) => {
            let mut out = Vec::new();
            for s in selectors {
                out.extend(resolve_inner(s, source)?);
            }
            out
        }
        Selector::Intersect(left, right) => {
            let l = resolve_inner(left, source)?;
            let r = resolve_inner(right, source)?;
            l.into_iter().filter(|idx| r.contains(idx)).collect()
        }
        Selector::Difference(left, right) => {
            let l = resolve_inner(left, source)?;
            let r = resolve_inner(right, source)?;
            l.into_iter().filter(|idx| !r.contains(idx)).collect()
        }
        Selector::Not(inner) => {
            let drop = resolve_inner(inner, source)?;
            (0..num_columns).filter(|idx| !drop.contains(idx)).collect()
        }
        Selector::All => (0..num_columns).collect(),
    })
}

fn metadata_match(source: &dyn TableAccess, pred: impl Fn(&str) -> bool) -> Vec<usize> {
    source
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| pred(&f.name))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::values::ColumnVec;

    fn table() -> Table {
        Table::try_new([
            ("a".to_string(), ColumnVec::int64s(&[1])),
            ("b".to_string(), ColumnVec::utf8s(&["x"])),
            ("c".to_string(), ColumnVec::int64s(&[2])),
            ("b2".to_string(), ColumnVec::float64s(&[0.5])),
        ])
        .unwrap()
    }

    fn positions(selector: Selector) -> Vec<usize> {
        resolve(&selector, &table()).unwrap().positions().to_vec()
    }

    #[test]
    fn strict_names_error_on_absent_columns() {
        let err = resolve(&Selector::named(["a", "z"]), &table()).unwrap_err();
        match err {
            CurlewError::Selection { reason, available, .. } => {
                assert!(reason.contains("`z`"));
                assert_eq!(available, vec!["a", "b", "c", "b2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_names_keep_the_present_subset() {
        assert_eq!(positions(Selector::any_named(["a", "z"])), vec![0]);
    }

    #[test]
    fn complement_preserves_table_order() {
        assert_eq!(
            positions(Selector::named(["a"]).negate()),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn selection_order_is_mention_order() {
        assert_eq!(positions(Selector::named(["c", "a"])), vec![2, 0]);
    }

    #[test]
    fn union_dedups_keeping_first_mention() {
        let sel = Selector::named(["c"]).union(Selector::StartsWith("b".to_string()));
        assert_eq!(positions(sel), vec![2, 1, 3]);
    }

    #[test]
    fn difference_and_intersection() {
        let sel = Selector::All.minus(Selector::named(["b"]));
        assert_eq!(positions(sel), vec![0, 2, 3]);

        let sel = Selector::StartsWith("b".to_string()).intersect(Selector::named(["b2", "a"]));
        assert_eq!(positions(sel), vec![3]);
    }

    #[test]
    fn type_and_pattern_selectors_use_metadata_only() {
        assert_eq!(positions(Selector::OfType(ValueType::Int64)), vec![0, 2]);
        assert_eq!(
            positions(Selector::Matches("^b[0-9]$".to_string())),
            vec![3]
        );
    }

    #[test]
    fn predicate_selector_reads_column_data() {
        let pred = ColumnPredicate::new("first value > 1", |col| {
            matches!(col.first_value(), Some(crate::values::Value::Int64(v)) if v > 1)
        });
        assert_eq!(positions(Selector::Where(pred)), vec![2]);
    }

    #[test]
    fn positional_selectors() {
        assert_eq!(positions(Selector::Index(1)), vec![1]);
        assert_eq!(positions(Selector::IndexRange(1, 2)), vec![1, 2]);
        assert_eq!(positions(Selector::Last), vec![3]);
        let err = resolve(&Selector::Index(9), &table()).unwrap_err();
        assert!(matches!(err, CurlewError::Selection { .. }));
    }
}
