//! Column, index, constraint, and projection definitions — the elements
//! that make up a `CREATE TABLE`'s parenthesised element list.

use super::{common::Ident, expr::Expr, select::Select, types::DataType};

/// `DEFAULT` / `MATERIALIZED` / `ALIAS` / `EPHEMERAL` column default kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Default,
    Materialized,
    Alias,
    Ephemeral
}

/// `CODEC(...)`, e.g. `CODEC(Delta, ZSTD(3))`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Codec {
    pub parts: Vec<CodecPart>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodecPart {
    pub name: String,
    pub args: Vec<Expr>
}

/// A single column definition inside a table's element list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name:         Ident,
    pub data_type:    DataType,
    pub default_kind: Option<DefaultKind>,
    pub default_expr: Option<Expr>,
    pub codec:        Option<Codec>,
    pub ttl:          Option<Expr>,
    pub comment:      Option<String>
}

impl ColumnDef {
    pub fn new(name: impl Into<Ident>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default_kind: None,
            default_expr: None,
            codec: None,
            ttl: None,
            comment: None
        }
    }

    /// True if any property besides the name differs from `other` — used
    /// by the table differ to decide whether a name-matched column needs a
    /// `MODIFY COLUMN`.
    pub fn differs_excluding_name(&self, other: &ColumnDef) -> bool {
        self.data_type != other.data_type
            || self.default_kind != other.default_kind
            || self.default_expr != other.default_expr
            || self.codec != other.codec
            || self.ttl != other.ttl
            || self.comment != other.comment
    }
}

/// `INDEX name expr TYPE type_fn GRANULARITY n`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name:        Ident,
    pub expr:        Expr,
    pub index_type:  super::expr::FunctionCall,
    pub granularity: Option<Expr>
}

/// `CONSTRAINT name CHECK expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: Ident,
    pub expr: Expr
}

/// `PROJECTION name (SELECT ... ORDER BY ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDef {
    pub name:  Ident,
    pub query: Select
}

/// One element of a `CREATE TABLE`'s parenthesised body.
#[derive(Debug, Clone, PartialEq)]
pub enum TableElement {
    Column(ColumnDef),
    Index(IndexDef),
    Constraint(ConstraintDef),
    Projection(ProjectionDef)
}

impl TableElement {
    pub fn as_column(&self) -> Option<&ColumnDef> {
        match self {
            Self::Column(c) => Some(c),
            _ => None
        }
    }
}
