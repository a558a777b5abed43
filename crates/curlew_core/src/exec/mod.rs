//! The verb layer: grouped evaluation, transformation, and column verbs.

pub mod columns;
pub mod options;
pub mod reduce;
pub mod transform;

pub use columns::{relocate, rename, select_columns, RelocateTo};
pub use options::{GroupPolicy, ReduceOptions};
pub use reduce::{reduce, summarize};
pub use transform::{expand_across, filter_rows, mutate, Across};

use crate::capture::Arg;
use crate::errors::Result;
use crate::scope::ScopeArena;
use crate::table::{Grouping, Table};
use crate::template::{NameSpec, NameTemplate, TemplateEnv};

/// One masking argument of a verb call, paired with how its output column
/// gets named.
#[derive(Debug, Clone)]
pub struct NamedExpr {
    pub name: NameSpec,
    pub arg: Arg,
}

impl NamedExpr {
    /// Name the output after the expression itself (label override or
    /// rendered syntax).
    pub fn auto(arg: impl Into<Arg>) -> NamedExpr {
        NamedExpr {
            name: NameSpec::Auto,
            arg: arg.into(),
        }
    }

    /// A literal output name.
    pub fn named(name: impl Into<String>, arg: impl Into<Arg>) -> NamedExpr {
        NamedExpr {
            name: NameSpec::Literal(name.into()),
            arg: arg.into(),
        }
    }

    /// A computed output name. In templates, `{name}` interpolates from the
    /// expression's scope and `{{expr}}` interpolates the expression's own
    /// label.
    pub fn templated(template: &str, arg: impl Into<Arg>) -> Result<NamedExpr> {
        Ok(NamedExpr {
            name: NameSpec::Template(NameTemplate::parse(template)?),
            arg: arg.into(),
        })
    }

    /// Resolve the output name. Called once per verb call, before any group
    /// is evaluated, so names are stable across groups.
    pub fn resolve_name(&self, scopes: &ScopeArena) -> Result<String> {
        match &self.name {
            NameSpec::Literal(name) => Ok(name.clone()),
            NameSpec::Auto => match &self.arg {
                Arg::Captured(capture) => Ok(capture.label()),
                Arg::Evaluated(_) => Err(crate::errors::CurlewError::capture(
                    "deriving an output name",
                )),
            },
            NameSpec::Template(template) => {
                let scope = match &self.arg {
                    Arg::Captured(capture) => capture.scope(),
                    Arg::Evaluated(_) => scopes.global(),
                };
                template.render(&TemplateEnv {
                    scopes,
                    scope,
                    args: &[("expr", &self.arg)],
                })
            }
        }
    }
}

/// Attach grouping keys to a table. Later verbs partition along them.
pub fn group_by<S: AsRef<str>>(table: &Table, keys: &[S]) -> Result<Table> {
    let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
    table.clone().with_grouping(Grouping::Keys(keys))
}

/// Remove all grouping structure.
pub fn ungroup(table: &Table) -> Table {
    table
        .clone()
        .with_grouping(Grouping::None)
        .expect("ungrouping cannot fail")
}

/// Make every row its own group.
pub fn rowwise(table: &Table) -> Table {
    table
        .clone()
        .with_grouping(Grouping::Rowwise)
        .expect("rowwise grouping cannot fail")
}
