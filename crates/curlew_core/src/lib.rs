//! Curlew core: the evaluation engine of a tabular data-manipulation
//! grammar.
//!
//! The pieces, leaves first:
//!
//! - [`capture`]: deferred expressions paired with the scope they were
//!   written in, forced on demand against a mask.
//! - [`mask`]: the layered name-resolution context for one (table, group)
//!   pair. Data-variables shadow env-variables; the `.data` pronoun gives
//!   explicit, scope-bypassing access to columns.
//! - [`expr`]: the host expression tree, its renderer, and the evaluator
//!   that dispatches splice nodes to their own owning scopes.
//! - [`template`]: computed output names with immediate and embrace markers.
//! - [`select`]: metadata-only column selection.
//! - [`table`]: tables, grouping metadata, partitioning, and the backend
//!   capability interface.
//! - [`exec`]: the verb layer — grouped reduction, transformation,
//!   filtering, and the column verbs.
//!
//! Numeric aggregate semantics live outside this crate, behind
//! [`functions::Callable`].

pub mod capture;
pub mod errors;
pub mod exec;
pub mod expr;
pub mod functions;
pub mod mask;
pub mod scope;
pub mod select;
pub mod table;
pub mod template;
pub mod testutil;
pub mod values;

pub use capture::{embrace, Arg, CapturedExpr};
pub use errors::{CurlewError, Result};
pub use exec::{GroupPolicy, NamedExpr, ReduceOptions};
pub use expr::evaluator::EvalContext;
pub use expr::Expression;
pub use functions::{Callable, FunctionRegistry};
pub use mask::Mask;
pub use scope::{ScopeArena, ScopeId};
pub use select::{SelectionSpec, Selector};
pub use table::{GroupOrder, GroupedTable, Grouping, Table};
pub use values::{ColumnVec, Datum, Value, ValueType};
