//! Scope records for captured expressions.
//!
//! Scopes form parent-linked chains rooted at a global scope. They live in an
//! explicit arena and are addressed by copyable ids, so a captured expression
//! can carry its owning scope around without lifetimes or reference cycles.

use std::collections::HashMap;

use ahash::RandomState;

use crate::values::Datum;

/// Handle into a [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct ScopeRecord {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Datum, RandomState>,
}

/// Arena owning every scope created during a sequence of verb calls.
///
/// Index 0 is the global scope.
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<ScopeRecord>,
}

impl ScopeArena {
    pub fn new() -> ScopeArena {
        ScopeArena {
            scopes: vec![ScopeRecord {
                parent: None,
                bindings: HashMap::default(),
            }],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a child scope. Lookups that miss in the child continue in the
    /// parent chain.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeRecord {
            parent: Some(parent),
            bindings: HashMap::default(),
        });
        id
    }

    /// Bind a name in `scope`, shadowing any binding of the same name in
    /// ancestor scopes.
    pub fn bind(&mut self, scope: ScopeId, name: impl Into<String>, value: impl Into<Datum>) {
        self.scopes[scope.0].bindings.insert(name.into(), value.into());
    }

    /// Walk the chain from `scope` to the global scope, returning the first
    /// binding of `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Datum> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let record = &self.scopes[id.0];
            if let Some(value) = record.bindings.get(name) {
                return Some(value);
            }
            current = record.parent;
        }
        None
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
