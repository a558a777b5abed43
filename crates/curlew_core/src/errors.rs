//! Error types for the evaluation core.

#[derive(Debug, thiserror::Error)]
pub enum CurlewError {
    /// An operation that requires a captured expression received an already
    /// evaluated value.
    #[error("expected a captured expression for {context}, got an already evaluated value")]
    Capture { context: String },

    /// A free name (or pronoun-qualified name) failed to resolve.
    #[error("could not resolve `{name}` (consulted: {layers})")]
    MaskResolution { name: String, layers: String },

    /// A selection referenced something that doesn't exist, or a selector was
    /// malformed.
    #[error("invalid selection {selector}: {reason} (columns: {})", available.join(", "))]
    Selection {
        selector: String,
        reason: String,
        available: Vec<String>,
    },

    /// Result lengths within one group's output block disagree.
    #[error(
        "length mismatch in group ({group_key}): `{expression}` (expression #{ordinal}) \
         produced {actual} values, block expects {expected}"
    )]
    LengthMismatch {
        group_key: String,
        expression: String,
        ordinal: usize,
        actual: usize,
        expected: usize,
    },

    /// An unrecognized grouping-result policy value.
    #[error("unrecognized grouping policy '{0}', expected one of: drop_last, drop, keep, rowwise")]
    GroupingPolicy(String),

    /// A malformed name template.
    #[error("template error in \"{template}\" at byte {position}: {message}")]
    TemplateSyntax {
        template: String,
        position: usize,
        message: String,
    },

    /// Evaluation failed inside one group. Wraps the underlying error with the
    /// group's key values and the position of the failing expression.
    #[error("group ({group_key}), expression #{ordinal} `{expression}`: {source}")]
    GroupEval {
        group_key: String,
        ordinal: usize,
        expression: String,
        #[source]
        source: Box<CurlewError>,
    },

    /// Anything else that went wrong while evaluating a host expression: type
    /// mismatches, arity mismatches, conflicting vector lengths inside a
    /// single expression.
    #[error("{0}")]
    Compute(String),
}

impl CurlewError {
    pub fn capture(context: impl Into<String>) -> Self {
        CurlewError::Capture {
            context: context.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>, layers: impl Into<String>) -> Self {
        CurlewError::MaskResolution {
            name: name.into(),
            layers: layers.into(),
        }
    }

    pub fn compute(msg: impl Into<String>) -> Self {
        CurlewError::Compute(msg.into())
    }
}

pub type Result<T, E = CurlewError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_eval_message_carries_context() {
        let err = CurlewError::GroupEval {
            group_key: "g = 2".to_string(),
            ordinal: 1,
            expression: "mean(x)".to_string(),
            source: Box::new(CurlewError::unresolved("x", "columns, locals, scope chain")),
        };
        let msg = err.to_string();
        assert!(msg.contains("g = 2"));
        assert!(msg.contains("#1"));
        assert!(msg.contains("mean(x)"));
    }
}
