//! Options governing the reduction protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CurlewError;

/// What grouping structure a reduced table keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    /// Remove the most recently added grouping key.
    DropLast,
    /// No grouping on the output.
    Drop,
    /// Grouping identical to the input.
    Keep,
    /// Every output row becomes its own group.
    Rowwise,
}

impl fmt::Display for GroupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupPolicy::DropLast => "drop_last",
            GroupPolicy::Drop => "drop",
            GroupPolicy::Keep => "keep",
            GroupPolicy::Rowwise => "rowwise",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GroupPolicy {
    type Err = CurlewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop_last" => Ok(GroupPolicy::DropLast),
            "drop" => Ok(GroupPolicy::Drop),
            "keep" => Ok(GroupPolicy::Keep),
            "rowwise" => Ok(GroupPolicy::Rowwise),
            other => Err(CurlewError::GroupingPolicy(other.to_string())),
        }
    }
}

/// Per-call reduction options.
#[derive(Debug, Clone, Default)]
pub struct ReduceOptions {
    /// Grouping policy for the output. `None` means infer: peel the last key
    /// when every group reduced to one row, keep the input grouping
    /// otherwise.
    pub policy: Option<GroupPolicy>,
    /// Suppress the informational notice emitted when the policy is
    /// inferred.
    pub quiet: bool,
}

impl ReduceOptions {
    pub fn with_policy(policy: GroupPolicy) -> ReduceOptions {
        ReduceOptions {
            policy: Some(policy),
            quiet: false,
        }
    }
}
