//! Table-level clauses: `ENGINE`, `ORDER BY`, `PARTITION BY`, `PRIMARY KEY`,
//! `SAMPLE BY`, `TTL`, `SETTINGS`, `COMMENT`. Stored in a fixed struct
//! (rather than a clause list) so that two semantically equal `CREATE
//! TABLE` statements always produce equal ASTs regardless of source
//! clause order (spec §3 invariant).

use indexmap::IndexMap;

use super::expr::Expr;

/// `ENGINE = Name(args...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSpec {
    pub name: String,
    pub args: Vec<Expr>
}

/// One `TTL` rule: an expression plus an optional action
/// (`TO DISK 'x'`, `TO VOLUME 'x'`, `DELETE`, `GROUP BY ...`).
#[derive(Debug, Clone, PartialEq)]
pub struct TtlItem {
    pub expr:   Expr,
    pub action: Option<TtlAction>
}

#[derive(Debug, Clone, PartialEq)]
pub enum TtlAction {
    Delete,
    ToDisk(String),
    ToVolume(String)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TtlClause {
    pub items: Vec<TtlItem>
}

/// Fixed-order table-level clause bag attached to `CREATE TABLE` and
/// updated in place by `ALTER TABLE ... MODIFY/RESET` operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableClauses {
    pub engine:       Option<EngineSpec>,
    pub order_by:     Vec<Expr>,
    pub partition_by: Option<Expr>,
    pub primary_key:  Option<Vec<Expr>>,
    pub sample_by:    Option<Expr>,
    pub ttl:          Option<TtlClause>,
    pub settings:     IndexMap<String, Expr>,
    pub comment:      Option<String>
}

/// `LIFETIME(MIN a MAX b)` or `LIFETIME(n)` for dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifetimeSpec {
    pub min: Option<i64>,
    pub max: Option<i64>
}
