//! Expression trees: literals, operators, function calls, and the handful
//! of ClickHouse-specific expression forms (`CAST`, `INTERVAL`, array/tuple
//! constructors) needed inside engine arguments, defaults, `TTL`, and
//! `SELECT` bodies.

use super::common::Ident;

/// A parsed SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (`42`, `3.14`, `'text'`, `NULL`, `TRUE`).
    Literal(Literal),
    /// A column or unqualified identifier (`id`, `now`).
    Identifier(Ident),
    /// A dotted reference (`t.id`, `db.t.id`).
    CompoundIdentifier(Vec<Ident>),
    /// `func(arg, ...)`, including aggregate/window functions.
    Function(FunctionCall),
    /// `left op right`.
    BinaryOp { left: Box<Expr>, op: BinaryOperator, right: Box<Expr> },
    /// `op expr` (unary minus, NOT).
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// `CAST(expr AS type)`.
    Cast { expr: Box<Expr>, data_type: Box<super::types::DataType> },
    /// `INTERVAL n UNIT`.
    Interval { value: Box<Expr>, unit: String },
    /// `[a, b, c]`.
    Array(Vec<Expr>),
    /// `(a, b, c)` as a value tuple (distinct from a parenthesised scalar).
    Tuple(Vec<Expr>),
    /// `map('k1', v1, 'k2', v2)` or `{'k1': v1}` constructor.
    Map(Vec<(Expr, Expr)>),
    /// A parenthesised sub-expression, preserved so formatting is exact.
    Nested(Box<Expr>),
    /// A scalar subquery (`(SELECT ...)`).
    Subquery(Box<super::select::Select>),
    /// `*` in `SELECT *` / `count(*)`.
    Wildcard,
    /// `expr IS [NOT] NULL`.
    IsNull { expr: Box<Expr>, negated: bool },
    /// `expr [NOT] IN (list...)`.
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    /// `expr [NOT] BETWEEN low AND high`.
    Between { expr: Box<Expr>, negated: bool, low: Box<Expr>, high: Box<Expr> },
    /// `CASE [operand] WHEN ... THEN ... ELSE ... END`.
    Case {
        operand:    Option<Box<Expr>>,
        when_then:  Vec<(Expr, Expr)>,
        else_expr:  Option<Box<Expr>>
    },
    /// `expr OVER (window-spec)`.
    Window { function: Box<Expr>, spec: WindowSpec }
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(Ident::new(name))
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Number(value.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }
}

/// Literal values. Numbers keep their original textual form (hex,
/// exponent, decimal) so formatting doesn't lose precision or notation.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    String(String),
    Bool(bool),
    Null
}

/// `name(args...)` — arbitrary positional expression arguments, used for
/// `ENGINE = Name(args)`, dictionary `SOURCE(...)`/`LAYOUT(...)`, and plain
/// function calls inside expressions.
///
/// `combinator_args` holds a second, independently-parenthesized argument
/// list for parametric aggregate/combinator calls like
/// `quantiles(0.5)(x)`: ClickHouse treats the two paren groups as
/// distinct (parameters vs. column arguments), so they're kept apart
/// rather than merged into one `args` list — merging them would render as
/// `quantiles(0.5, x)`, a different call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name:             String,
    pub args:             Vec<Expr>,
    pub combinator_args:  Option<Vec<Expr>>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Like,
    NotLike,
    Concat
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not
}

/// Minimal window specification: `PARTITION BY ... ORDER BY ...`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by:     Vec<super::select::OrderByItem>
}
