//! Name templates for dynamically generated output names.
//!
//! Two marker kinds:
//!
//! - `{name}` — immediate substitution: `name` is looked up in the current
//!   scope chain and its scalar value interpolated, eagerly.
//! - `{{arg}}` — embrace marker: `arg` names a captured argument, and the
//!   capture's *label* (explicit override, or its syntax rendered as text) is
//!   interpolated. The capture is never evaluated.
//!
//! Choosing a template over a literal name is the grammar's "the left side is
//! a computed name" signal; [`NameSpec`] models the three cases.

use crate::capture::Arg;
use crate::errors::{CurlewError, Result};
use crate::scope::{ScopeArena, ScopeId};
use crate::values::Datum;

/// How a verb argument gets its output name.
#[derive(Debug, Clone)]
pub enum NameSpec {
    /// Derive from the expression's label (override or rendered syntax).
    Auto,
    /// A literal identifier.
    Literal(String),
    /// A computed name, rendered through a parsed template.
    Template(NameTemplate),
}

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Text(String),
    Immediate(String),
    Embrace(String),
}

/// A parsed name template.
#[derive(Debug, Clone, PartialEq)]
pub struct NameTemplate {
    source: String,
    parts: Vec<TemplatePart>,
}

/// Everything a template render can reach: the scope to interpolate from and
/// the captured arguments addressable by embrace markers.
#[derive(Debug, Clone, Copy)]
pub struct TemplateEnv<'a> {
    pub scopes: &'a ScopeArena,
    pub scope: ScopeId,
    pub args: &'a [(&'a str, &'a Arg)],
}

impl NameTemplate {
    pub fn parse(source: &str) -> Result<NameTemplate> {
        let err = |position: usize, message: &str| CurlewError::TemplateSyntax {
            template: source.to_string(),
            position,
            message: message.to_string(),
        };

        let bytes = source.as_bytes();
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    let embrace = bytes.get(i + 1) == Some(&b'{');
                    let start = if embrace { i + 2 } else { i + 1 };
                    let close = source[start..]
                        .find('}')
                        .map(|off| start + off)
                        .ok_or_else(|| err(i, "unmatched '{'"))?;
                    if embrace && bytes.get(close + 1) != Some(&b'}') {
                        return Err(err(i, "unmatched '{{'"));
                    }
                    let name = source[start..close].trim();
                    if name.is_empty() {
                        return Err(err(i, "empty substitution marker"));
                    }
                    if name.contains('{') {
                        return Err(err(i, "nested '{' inside a marker"));
                    }
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    if embrace {
                        parts.push(TemplatePart::Embrace(name.to_string()));
                        i = close + 2;
                    } else {
                        parts.push(TemplatePart::Immediate(name.to_string()));
                        i = close + 1;
                    }
                }
                b'}' => return Err(err(i, "unmatched '}'")),
                _ => {
                    // Advance over one UTF-8 character.
                    let ch_len = source[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                    text.push_str(&source[i..i + ch_len]);
                    i += ch_len;
                }
            }
        }
        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }

        Ok(NameTemplate {
            source: source.to_string(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, env: &TemplateEnv<'_>) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Immediate(name) => {
                    let value = env
                        .scopes
                        .lookup(env.scope, name)
                        .ok_or_else(|| CurlewError::unresolved(name.clone(), "scope chain"))?;
                    match value {
                        Datum::Scalar(value) => out.push_str(&value.render()),
                        other => {
                            return Err(CurlewError::compute(format!(
                                "template marker `{name}` must interpolate a scalar, got {} values",
                                other.len()
                            )))
                        }
                    }
                }
                TemplatePart::Embrace(name) => {
                    let arg = env
                        .args
                        .iter()
                        .find(|(arg_name, _)| *arg_name == name.as_str())
                        .map(|(_, arg)| *arg)
                        .ok_or_else(|| CurlewError::TemplateSyntax {
                            template: self.source.clone(),
                            position: 0,
                            message: format!("no argument named `{name}` for embrace marker"),
                        })?;
                    let capture = arg.as_capture("template embrace marker")?;
                    out.push_str(&capture.label());
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturedExpr;
    use crate::expr::{call, col};
    use crate::values::Value;

    #[test]
    fn immediate_markers_interpolate_scope_values() {
        let mut scopes = ScopeArena::new();
        let scope = scopes.child(scopes.global());
        scopes.bind(scope, "var", Value::from("height"));

        let template = NameTemplate::parse("mean_{var}").unwrap();
        let out = template
            .render(&TemplateEnv {
                scopes: &scopes,
                scope,
                args: &[],
            })
            .unwrap();
        assert_eq!(out, "mean_height");
    }

    #[test]
    fn embrace_markers_use_the_label_without_evaluating() {
        let scopes = ScopeArena::new();
        // `missing` resolves nowhere: rendering must not care.
        let arg = Arg::Captured(CapturedExpr::capture(
            call("mean", [col("missing")]),
            scopes.global(),
        ));

        let template = NameTemplate::parse("{{expr}}_scaled").unwrap();
        let out = template
            .render(&TemplateEnv {
                scopes: &scopes,
                scope: scopes.global(),
                args: &[("expr", &arg)],
            })
            .unwrap();
        assert_eq!(out, "mean(missing)_scaled");
    }

    #[test]
    fn embrace_marker_honors_label_override() {
        let scopes = ScopeArena::new();
        let arg = Arg::Captured(
            CapturedExpr::capture(call("mean", [col("x")]), scopes.global()).with_label("avg"),
        );

        let template = NameTemplate::parse("{{expr}}").unwrap();
        let out = template
            .render(&TemplateEnv {
                scopes: &scopes,
                scope: scopes.global(),
                args: &[("expr", &arg)],
            })
            .unwrap();
        assert_eq!(out, "avg");
    }

    #[test]
    fn embrace_marker_rejects_evaluated_args() {
        let scopes = ScopeArena::new();
        let arg = Arg::Evaluated(Datum::Scalar(Value::Int64(1)));
        let template = NameTemplate::parse("{{expr}}").unwrap();
        let err = template
            .render(&TemplateEnv {
                scopes: &scopes,
                scope: scopes.global(),
                args: &[("expr", &arg)],
            })
            .unwrap_err();
        assert!(matches!(err, CurlewError::Capture { .. }));
    }

    #[test]
    fn unmatched_markers_fail_to_parse() {
        assert!(matches!(
            NameTemplate::parse("mean_{var").unwrap_err(),
            CurlewError::TemplateSyntax { .. }
        ));
        assert!(matches!(
            NameTemplate::parse("oops}").unwrap_err(),
            CurlewError::TemplateSyntax { .. }
        ));
        assert!(matches!(
            NameTemplate::parse("{{x}").unwrap_err(),
            CurlewError::TemplateSyntax { .. }
        ));
        assert!(matches!(
            NameTemplate::parse("{}").unwrap_err(),
            CurlewError::TemplateSyntax { .. }
        ));
    }
}
