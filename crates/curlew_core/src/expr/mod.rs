//! The host expression tree.
//!
//! Expressions reference columns and scope bindings by name, call named
//! primitives from a function registry, and may contain splice nodes wrapping
//! a captured expression from another scope. This is deliberately not a
//! general-purpose language: just enough structure to host calls into the
//! primitive library and combine their results.

pub mod display;
pub mod evaluator;

use crate::capture::CapturedExpr;
use crate::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

/// Explicit pronoun-qualified column access, bypassing the scope chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PronounAccess {
    /// `.data.name` — a literal column name.
    Field(String),
    /// `.data[expr]` — the column named by a runtime string.
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A free name, resolved through the mask's layered lookup.
    Ident(String),
    Literal(Value),
    Pronoun(PronounAccess),
    /// Call a named primitive from the function registry.
    Call {
        name: String,
        args: Vec<Expression>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A spliced capture. Evaluates with the capture's own scope as ambient
    /// scope, not the scope of the expression it was spliced into.
    Splice(CapturedExpr),
}

/// Reference a column or scope binding by name.
pub fn col(name: impl Into<String>) -> Expression {
    Expression::Ident(name.into())
}

/// A literal value.
pub fn lit(value: impl Into<Value>) -> Expression {
    Expression::Literal(value.into())
}

/// Call a named primitive.
pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Call {
        name: name.into(),
        args: args.into_iter().collect(),
    }
}

/// Pronoun access with a literal column name.
pub fn data_col(name: impl Into<String>) -> Expression {
    Expression::Pronoun(PronounAccess::Field(name.into()))
}

/// Pronoun access with a computed column name.
pub fn data_col_expr(name: Expression) -> Expression {
    Expression::Pronoun(PronounAccess::Computed(name.boxed()))
}

impl Expression {
    pub fn boxed(self) -> Box<Expression> {
        Box::new(self)
    }

    fn binary(self, op: BinaryOperator, rhs: Expression) -> Expression {
        Expression::Binary {
            op,
            left: self.boxed(),
            right: rhs.boxed(),
        }
    }

    pub fn add(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Add, rhs)
    }

    pub fn sub(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Sub, rhs)
    }

    pub fn mul(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Mul, rhs)
    }

    pub fn div(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Div, rhs)
    }

    pub fn equals(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Eq, rhs)
    }

    pub fn not_equals(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::NotEq, rhs)
    }

    pub fn lt(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Lt, rhs)
    }

    pub fn lt_eq(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::LtEq, rhs)
    }

    pub fn gt(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Gt, rhs)
    }

    pub fn gt_eq(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::GtEq, rhs)
    }

    pub fn and(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::And, rhs)
    }

    pub fn or(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Or, rhs)
    }

    pub fn neg(self) -> Expression {
        Expression::Unary {
            op: UnaryOperator::Neg,
            expr: self.boxed(),
        }
    }

    pub fn not(self) -> Expression {
        Expression::Unary {
            op: UnaryOperator::Not,
            expr: self.boxed(),
        }
    }

    /// Try to get the referenced name if this is a plain identifier.
    pub fn try_get_ident(&self) -> Option<&str> {
        match self {
            Expression::Ident(name) => Some(name),
            _ => None,
        }
    }
}
