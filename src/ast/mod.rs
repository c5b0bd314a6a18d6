//! The typed ClickHouse DDL abstract syntax tree.
//!
//! `Statement` (see [`statement::Statement`]) is the AST root: a closed
//! tagged union over every DDL kind the engine understands, plus the
//! minimal `SELECT` subset needed for view bodies. Sub-modules group the
//! shared building blocks (`Ident`/`QualifiedName`, expressions, data
//! types, column/table elements) that those statements are built from.

pub mod column;
pub mod common;
pub mod expr;
pub mod select;
pub mod statement;
pub mod table;
pub mod types;

pub use column::{Codec, CodecPart, ColumnDef, ConstraintDef, DefaultKind, IndexDef, ProjectionDef, TableElement};
pub use common::{Ident, QualifiedName};
pub use expr::{BinaryOperator, Expr, FunctionCall, Literal, UnaryOperator, WindowSpec};
pub use select::{FromClause, FromSource, Join, JoinKind, OrderByItem, Select, SelectItem};
pub use statement::*;
pub use table::{EngineSpec, LifetimeSpec, TableClauses, TtlAction, TtlClause, TtlItem};
pub use types::{DataType, TypeArg};

/// The root of a parsed SQL file: an ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    pub statements: Vec<Statement>
}

impl Sql {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}
