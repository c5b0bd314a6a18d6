//! The `Statement` root: a closed tagged union over every supported DDL
//! (and minimal DML/SELECT) kind. Exhaustive matching is required
//! everywhere a `StatementKind` is consumed — adding a new DDL kind forces
//! a compile-time update to the differ and formatter (design note §9).

use indexmap::IndexMap;

use super::{
    column::{ColumnDef, ConstraintDef, IndexDef, ProjectionDef},
    common::{Ident, QualifiedName},
    expr::Expr,
    select::Select,
    table::{EngineSpec, LifetimeSpec, TableClauses, TtlClause}
};

/// A parsed statement plus the comment trivia attached to it.
///
/// Comments attach as leading/trailing string sequences on the statement
/// node (design note §9) rather than as free-floating nodes, so
/// round-tripping never reorders them relative to the statement they
/// documented.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub leading_comments:  Vec<String>,
    pub trailing_comments: Vec<String>,
    pub kind:              StatementKind
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { leading_comments: Vec::new(), trailing_comments: Vec::new(), kind }
    }

    /// The `ON CLUSTER` identifier carried by this statement, if the kind
    /// supports one. Used by [`crate::parser::cluster::inject_on_cluster`]
    /// and by the executor when formatting statements for a clustered
    /// target.
    pub fn on_cluster(&self) -> Option<&Ident> {
        self.kind.on_cluster()
    }

    pub fn set_on_cluster(&mut self, cluster: Ident) {
        self.kind.set_on_cluster(cluster);
    }
}

macro_rules! on_cluster_accessors {
    ($self:expr, $($variant:ident),+ $(,)?) => {
        match $self {
            $(StatementKind::$variant(s) => s.on_cluster.as_ref(),)+
            _ => None
        }
    };
}

macro_rules! set_on_cluster_accessors {
    ($self:expr, $cluster:expr, $($variant:ident),+ $(,)?) => {
        match $self {
            $(StatementKind::$variant(s) => {
                if s.on_cluster.is_none() {
                    s.on_cluster = Some($cluster);
                }
            })+
            _ => {}
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    CreateDatabase(CreateDatabase),
    AlterDatabase(AlterDatabase),
    AttachDatabase(AttachDatabase),
    DetachDatabase(DetachDatabase),
    DropDatabase(DropDatabase),
    RenameDatabase(RenameDatabase),

    CreateTable(CreateTable),
    AlterTable(AlterTable),
    AttachTable(AttachTable),
    DetachTable(DetachTable),
    DropTable(DropTable),
    RenameTable(RenameTable),

    CreateDictionary(CreateDictionary),
    AttachDictionary(AttachDictionary),
    DetachDictionary(DetachDictionary),
    DropDictionary(DropDictionary),
    RenameDictionary(RenameDictionary),

    CreateView(CreateView),
    CreateMaterializedView(CreateMaterializedView),
    AttachView(AttachView),
    DetachView(DetachView),
    DropView(DropView),
    RenameView(RenameView),

    CreateRole(CreateRole),
    AlterRole(AlterRole),
    DropRole(DropRole),
    GrantRole(GrantRole),
    RevokeRole(RevokeRole),
    SetRole(SetRole),

    CreateUser(CreateUser),
    AlterUser(AlterUser),
    DropUser(DropUser),

    CreateNamedCollection(CreateNamedCollection),
    AlterNamedCollection(AlterNamedCollection),
    DropNamedCollection(DropNamedCollection),

    CreateFunction(CreateFunction),
    DropFunction(DropFunction),

    Select(Select),

    /// A standalone comment with no attached statement, preserved so its
    /// position in the file survives round-tripping.
    CommentStatement(String)
}

impl StatementKind {
    pub fn on_cluster(&self) -> Option<&Ident> {
        on_cluster_accessors!(
            self,
            CreateDatabase,
            AlterDatabase,
            AttachDatabase,
            DetachDatabase,
            DropDatabase,
            RenameDatabase,
            CreateTable,
            AlterTable,
            AttachTable,
            DetachTable,
            DropTable,
            RenameTable,
            CreateDictionary,
            AttachDictionary,
            DetachDictionary,
            DropDictionary,
            RenameDictionary,
            CreateView,
            CreateMaterializedView,
            AttachView,
            DetachView,
            DropView,
            RenameView,
            CreateRole,
            AlterRole,
            DropRole,
            GrantRole,
            RevokeRole,
            CreateUser,
            AlterUser,
            DropUser,
            CreateNamedCollection,
            AlterNamedCollection,
            DropNamedCollection,
            CreateFunction,
            DropFunction
        )
    }

    pub fn set_on_cluster(&mut self, cluster: Ident) {
        set_on_cluster_accessors!(
            self,
            cluster,
            CreateDatabase,
            AlterDatabase,
            AttachDatabase,
            DetachDatabase,
            DropDatabase,
            RenameDatabase,
            CreateTable,
            AlterTable,
            AttachTable,
            DetachTable,
            DropTable,
            RenameTable,
            CreateDictionary,
            AttachDictionary,
            DetachDictionary,
            DropDictionary,
            RenameDictionary,
            CreateView,
            CreateMaterializedView,
            AttachView,
            DetachView,
            DropView,
            RenameView,
            CreateRole,
            AlterRole,
            DropRole,
            GrantRole,
            RevokeRole,
            CreateUser,
            AlterUser,
            DropUser,
            CreateNamedCollection,
            AlterNamedCollection,
            DropNamedCollection,
            CreateFunction,
            DropFunction
        )
    }
}

// --- databases ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabase {
    pub name:            Ident,
    pub if_not_exists:   bool,
    pub on_cluster:       Option<Ident>,
    pub engine:          Option<EngineSpec>,
    pub comment:         Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterDatabase {
    pub name:       Ident,
    pub on_cluster: Option<Ident>,
    pub actions:    Vec<AlterDatabaseAction>
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterDatabaseAction {
    ModifyComment(String),
    ModifySetting(String, Expr)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachDatabase {
    pub name:          Ident,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetachDatabase {
    pub name:        Ident,
    pub if_exists:   bool,
    pub on_cluster:  Option<Ident>,
    pub permanently: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropDatabase {
    pub name:       Ident,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameDatabase {
    pub from:       Ident,
    pub to:         Ident,
    pub on_cluster: Option<Ident>
}

// --- tables --------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub elements:      Vec<super::column::TableElement>,
    pub clauses:       TableClauses
}

impl CreateTable {
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.elements.iter().filter_map(|e| e.as_column())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub name:       QualifiedName,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>,
    pub actions:    Vec<AlterTableAction>
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    AddColumn { column: ColumnDef, after: Option<Ident>, first: bool },
    DropColumn { name: Ident },
    RenameColumn { from: Ident, to: Ident },
    ModifyColumn {
        name:           Ident,
        data_type:      Option<super::types::DataType>,
        default_kind:   Option<super::column::DefaultKind>,
        default_expr:   Option<Expr>,
        comment:        Option<String>
    },
    ModifyColumnRemoveDefault { name: Ident },
    CommentColumn { name: Ident, comment: String },
    ModifyColumnCodec { name: Ident, codec: super::column::Codec },
    ModifyColumnTtl { name: Ident, ttl: Expr },
    AddIndex { index: IndexDef, after: Option<Ident> },
    DropIndex { name: Ident },
    AddConstraint { constraint: ConstraintDef },
    DropConstraint { name: Ident },
    AddProjection { projection: ProjectionDef },
    DropProjection { name: Ident },
    ModifyTtl { ttl: TtlClause },
    ModifyOrderBy { columns: Vec<Expr> },
    ModifySampleBy { expr: Expr },
    RemoveSampleBy,
    ModifySetting { name: String, value: Expr },
    ResetSetting { name: String },
    ModifyComment(String),
    /// `MODIFY QUERY ...` for views re-expressed as a table alter (ClickHouse
    /// supports this for both plain and materialized views).
    ModifyQuery(Select)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachTable {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetachTable {
    pub name:        QualifiedName,
    pub if_exists:   bool,
    pub on_cluster:  Option<Ident>,
    pub permanently: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub name:       QualifiedName,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTable {
    pub from:       QualifiedName,
    pub to:         QualifiedName,
    pub on_cluster: Option<Ident>
}

// --- dictionaries --------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDictionary {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub columns:       Vec<ColumnDef>,
    pub primary_key:   Vec<Ident>,
    pub source:        super::expr::FunctionCall,
    pub layout:        super::expr::FunctionCall,
    pub lifetime:      LifetimeSpec,
    pub settings:       IndexMap<String, Expr>,
    pub comment:       Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachDictionary {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetachDictionary {
    pub name:        QualifiedName,
    pub if_exists:   bool,
    pub on_cluster:  Option<Ident>,
    pub permanently: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropDictionary {
    pub name:       QualifiedName,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameDictionary {
    pub from:       QualifiedName,
    pub to:         QualifiedName,
    pub on_cluster: Option<Ident>
}

// --- views -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub columns:       Option<Vec<Ident>>,
    pub query:         Select,
    pub comment:       Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMaterializedView {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub to:            Option<QualifiedName>,
    pub clauses:       TableClauses,
    pub columns:       Option<Vec<ColumnDef>>,
    pub populate:      bool,
    pub query:         Select,
    pub comment:       Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachView {
    pub name:          QualifiedName,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetachView {
    pub name:        QualifiedName,
    pub if_exists:   bool,
    pub on_cluster:  Option<Ident>,
    pub permanently: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropView {
    pub name:       QualifiedName,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameView {
    pub from:       QualifiedName,
    pub to:         QualifiedName,
    pub on_cluster: Option<Ident>
}

// --- roles / users / named collections / functions ------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRole {
    pub names:          Vec<Ident>,
    pub if_not_exists:  bool,
    pub on_cluster:     Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterRole {
    pub name:       Ident,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropRole {
    pub names:      Vec<Ident>,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantRole {
    pub roles:      Vec<Ident>,
    pub to:         Vec<Ident>,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevokeRole {
    pub roles:      Vec<Ident>,
    pub from:       Vec<Ident>,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetRole {
    pub roles: Vec<Ident>,
    pub default: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUser {
    pub name:            Ident,
    pub if_not_exists:   bool,
    pub on_cluster:      Option<Ident>,
    pub identified_with: Option<String>,
    pub identified_by:   Option<String>,
    pub hosts:           Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterUser {
    pub name:            Ident,
    pub on_cluster:      Option<Ident>,
    pub identified_with: Option<String>,
    pub identified_by:   Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropUser {
    pub names:      Vec<Ident>,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateNamedCollection {
    pub name:          Ident,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub settings:       IndexMap<String, Expr>
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterNamedCollection {
    pub name:       Ident,
    pub on_cluster: Option<Ident>,
    pub set:         IndexMap<String, Expr>,
    pub delete:     Vec<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropNamedCollection {
    pub name:       Ident,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunction {
    pub name:          Ident,
    pub if_not_exists: bool,
    pub on_cluster:    Option<Ident>,
    pub params:        Vec<Ident>,
    pub body:          Expr
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropFunction {
    pub name:       Ident,
    pub if_exists:  bool,
    pub on_cluster: Option<Ident>
}
