//! An engine-agnostic, lazily evaluated column expression.
//!
//! Expressions are plain trees; nothing is computed until an `Engine` runs the
//! compiled `Program` against a table.
use crate::store::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Sub,
    Lt,
    LtEq,
    And,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::And => "AND",
        }
    }
}

/// A single global window. There is no partitioning; `order_by` keys that are
/// all literals leave rows in the table's native order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub order_by: Vec<Expr>,
}

impl WindowSpec {
    pub fn order_by(keys: Vec<Expr>) -> Self {
        Self { order_by: keys }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    /// Value of `expr` `offset` rows earlier in the window order, null before that.
    Lag { expr: Box<Expr>, offset: u32, window: WindowSpec },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// Whole days from `start` to `end`.
    DateDiff { end: Box<Expr>, start: Box<Expr> },
    IsNull(Box<Expr>),
    IsNan(Box<Expr>),
    Not(Box<Expr>),
    Case { when: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
}

pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

pub fn lit(value: impl Into<Scalar>) -> Expr {
    Expr::Literal(value.into())
}

pub fn date_diff(end: Expr, start: Expr) -> Expr {
    Expr::DateDiff { end: Box::new(end), start: Box::new(start) }
}

pub fn when(condition: Expr) -> WhenBuilder {
    WhenBuilder { condition }
}

pub struct WhenBuilder {
    condition: Expr,
}

impl WhenBuilder {
    pub fn then(self, value: Expr) -> WhenThenBuilder {
        WhenThenBuilder { condition: self.condition, value }
    }
}

pub struct WhenThenBuilder {
    condition: Expr,
    value: Expr,
}

impl WhenThenBuilder {
    pub fn otherwise(self, value: Expr) -> Expr {
        Expr::Case {
            when: Box::new(self.condition),
            then: Box::new(self.value),
            otherwise: Box::new(value),
        }
    }
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(self), right: Box::new(right) }
    }

    pub fn sub(self, right: Expr) -> Expr { self.binary(BinaryOp::Sub, right) }
    pub fn lt(self, right: Expr) -> Expr { self.binary(BinaryOp::Lt, right) }
    pub fn lt_eq(self, right: Expr) -> Expr { self.binary(BinaryOp::LtEq, right) }
    pub fn and(self, right: Expr) -> Expr { self.binary(BinaryOp::And, right) }

    pub fn lag(self, offset: u32, window: WindowSpec) -> Expr {
        Expr::Lag { expr: Box::new(self), offset, window }
    }

    pub fn is_null(self) -> Expr { Expr::IsNull(Box::new(self)) }
    pub fn is_nan(self) -> Expr { Expr::IsNan(Box::new(self)) }

    pub fn not(self) -> Expr { Expr::Not(Box::new(self)) }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Lag { expr, offset, window } => {
                write!(f, "lag({}, {}) OVER (", expr, offset)?;
                if !window.order_by.is_empty() {
                    write!(f, "ORDER BY ")?;
                    for (i, key) in window.order_by.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{} ASC NULLS FIRST", key)?;
                    }
                }
                write!(f, ")")
            }
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::DateDiff { end, start } => write!(f, "datediff({}, {})", end, start),
            Expr::IsNull(e) => write!(f, "({} IS NULL)", e),
            Expr::IsNan(e) => write!(f, "isnan({})", e),
            Expr::Not(e) => write!(f, "(NOT {})", e),
            Expr::Case { when, then, otherwise } => {
                write!(f, "CASE WHEN {} THEN {} ELSE {} END", when, then, otherwise)
            }
        }
    }
}
