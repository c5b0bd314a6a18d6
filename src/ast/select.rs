//! A minimal `SELECT` subset, sufficient to express view bodies and
//! projection queries. Not a general SQL query engine — joins, subqueries,
//! and a handful of clauses are supported because ClickHouse view
//! definitions commonly use them, nothing more.

use super::{common::Ident, common::QualifiedName, expr::Expr};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct:  bool,
    pub columns:   Vec<SelectItem>,
    pub from:      Option<FromClause>,
    pub where_:    Option<Expr>,
    pub group_by:  Vec<Expr>,
    pub having:    Option<Expr>,
    pub order_by:  Vec<OrderByItem>,
    pub limit:     Option<Expr>,
    pub settings:  Vec<(String, Expr)>
}

impl Default for Select {
    fn default() -> Self {
        Self {
            distinct: false,
            columns: Vec::new(),
            from: None,
            where_: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            settings: Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr:  Expr,
    pub alias: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: FromSource,
    pub alias:  Option<Ident>,
    pub joins:  Vec<Join>
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    Table(QualifiedName),
    Subquery(Box<Select>)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind:   JoinKind,
    pub source: FromSource,
    pub alias:  Option<Ident>,
    pub on:     Option<Expr>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr:  Expr,
    pub desc:  bool
}
