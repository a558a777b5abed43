//! Render expression trees back to readable text.
//!
//! Used for default output-name derivation and error messages. Splice nodes
//! render as the spliced expression's own text.

use std::fmt;

use super::{BinaryOperator, Expression, PronounAccess, UnaryOperator};

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{s}")
    }
}

/// Wrap nested binary expressions in parens so `a * (b + c)` round-trips
/// unambiguously; leaves print bare.
fn fmt_operand(expr: &Expression, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expr {
        Expression::Binary { .. } => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Ident(name) => write!(f, "{name}"),
            Expression::Literal(v) => write!(f, "{v}"),
            Expression::Pronoun(PronounAccess::Field(name)) => {
                write!(f, "{}.{name}", crate::mask::PRONOUN)
            }
            Expression::Pronoun(PronounAccess::Computed(expr)) => {
                write!(f, "{}[{expr}]", crate::mask::PRONOUN)
            }
            Expression::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expression::Unary { op, expr } => {
                let op = match op {
                    UnaryOperator::Neg => "-",
                    UnaryOperator::Not => "!",
                };
                write!(f, "{op}")?;
                fmt_operand(expr, f)
            }
            Expression::Binary { op, left, right } => {
                fmt_operand(left, f)?;
                write!(f, " {op} ")?;
                fmt_operand(right, f)
            }
            Expression::Splice(capture) => write!(f, "{}", capture.expression()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{call, col, lit};

    #[test]
    fn renders_source_like_text() {
        let expr = call("mean", [col("x")]).add(lit(1i64));
        assert_eq!(expr.to_string(), "mean(x) + 1");
    }

    #[test]
    fn nested_binaries_get_parens() {
        let expr = col("a").mul(col("b").add(col("c")));
        assert_eq!(expr.to_string(), "a * (b + c)");
    }

    #[test]
    fn pronoun_access() {
        let expr = super::super::data_col("x");
        assert_eq!(expr.to_string(), ".data.x");
        let expr = super::super::data_col_expr(lit("x"));
        assert_eq!(expr.to_string(), ".data[\"x\"]");
    }
}
