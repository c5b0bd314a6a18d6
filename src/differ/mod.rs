//! Schema differ: `(current, target)` AST pair → ordered diff list with
//! forward and reverse SQL (spec §4.3).
//!
//! The hard column/clause-level table alter synthesis lives in
//! [`table`]; this module is the orchestration layer — it buckets
//! `CREATE` statements by object kind, detects renames before pairing
//! creates with drops, and assembles the result in the fixed global
//! order: databases, then dictionaries, then tables, then views.

mod table;

use std::collections::HashSet;

use crate::{
    ast::{
        AlterDatabase, AlterDatabaseAction, AlterTable, AlterTableAction, CreateDatabase,
        CreateDictionary, CreateMaterializedView, CreateTable, CreateView, DropDatabase,
        DropDictionary, DropTable, DropView, Ident, QualifiedName, RenameDatabase, RenameDictionary,
        RenameTable, RenameView, Sql, StatementKind, TableElement
    },
    error::{HousekeeperError, Result, unsupported_error}
};

/// Which schema object a [`Diff`] touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Database,
    Table,
    Dictionary,
    View,
    MaterializedView
}

/// What kind of change a [`Diff`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Create,
    Alter,
    /// Dictionaries have no `ALTER` — any property change is a drop+create.
    Replace,
    Rename,
    Drop
}

/// One typed schema change, with both directions of SQL pre-rendered.
#[derive(Debug, Clone)]
pub struct Diff {
    pub object_kind:  ObjectKind,
    pub diff_kind:    DiffKind,
    /// `db.name`, or bare `name` for databases — used for sorting and
    /// for the ordering-law invariant (spec §8.4).
    pub identity:     String,
    pub description:  String,
    pub forward_sql:  Vec<String>,
    pub reverse_sql:  Vec<String>
}

impl Diff {
    fn new(
        object_kind: ObjectKind,
        diff_kind: DiffKind,
        identity: impl Into<String>,
        description: impl Into<String>,
        forward_sql: Vec<String>,
        reverse_sql: Vec<String>
    ) -> Self {
        Self {
            object_kind,
            diff_kind,
            identity: identity.into(),
            description: description.into(),
            forward_sql,
            reverse_sql
        }
    }
}

/// Produce the ordered diff list advancing `current` toward `target`.
///
/// Returns `Err(NoDiff)` if the two schemas are already equal. Returns
/// `Err(Unsupported)` the moment any single object requires a change
/// ClickHouse cannot express as an in-place alter.
pub fn diff_schema(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let mut databases = diff_databases(current, target)?;
    let mut dictionaries = diff_dictionaries(current, target);
    let mut tables = diff_tables(current, target)?;
    let mut views = diff_views(current, target)?;

    sort_step(&mut databases);
    sort_step(&mut dictionaries);
    sort_step(&mut tables);
    sort_step(&mut views);

    let mut diffs = Vec::new();
    diffs.append(&mut databases);
    diffs.append(&mut dictionaries);
    diffs.append(&mut tables);
    diffs.append(&mut views);

    if diffs.is_empty() {
        return Err(HousekeeperError::NoDiff);
    }
    Ok(diffs)
}

/// Sort a single global-ordering step by `DiffKind` (Create, Alter,
/// Replace, Rename, Drop) and then by qualified name within that kind.
fn sort_step(diffs: &mut [Diff]) {
    diffs.sort_by(|a, b| diff_kind_rank(a.diff_kind).cmp(&diff_kind_rank(b.diff_kind)).then_with(|| a.identity.cmp(&b.identity)));
}

fn diff_kind_rank(kind: DiffKind) -> u8 {
    match kind {
        DiffKind::Create => 0,
        DiffKind::Alter => 1,
        DiffKind::Replace => 1,
        DiffKind::Rename => 2,
        DiffKind::Drop => 3
    }
}

fn render(kind: StatementKind) -> String {
    format!("{};", crate::formatter::render_statement_kind(&kind))
}

/// Scan `current_only`/`target_only` for pairs identical under
/// `same_except_identity`, remove each matched pair from both lists, and
/// return the `(from, to)` identity pairs found. Order-stable for the
/// unmatched remainder.
fn detect_renames<K, T>(
    current_only: &mut Vec<(K, T)>,
    target_only: &mut Vec<(K, T)>,
    same_except_identity: impl Fn(&T, &T) -> bool
) -> Vec<(K, K)> {
    let mut renames = Vec::new();
    let mut i = 0;
    while i < current_only.len() {
        let found = target_only.iter().position(|(_, t)| same_except_identity(&current_only[i].1, t));
        match found {
            Some(pos) => {
                let (from, _) = current_only.remove(i);
                let (to, _) = target_only.remove(pos);
                renames.push((from, to));
            }
            None => i += 1
        }
    }
    renames
}

// --- databases -------------------------------------------------------------

fn collect_databases(sql: &Sql) -> Vec<&CreateDatabase> {
    sql.statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::CreateDatabase(d) => Some(d),
            _ => None
        })
        .collect()
}

fn databases_equal_except_name(a: &CreateDatabase, b: &CreateDatabase) -> bool {
    a.engine == b.engine && a.comment == b.comment && a.on_cluster == b.on_cluster
}

fn diff_databases(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let current_list = collect_databases(current);
    let target_list = collect_databases(target);

    let mut current_only: Vec<(String, &CreateDatabase)> = current_list
        .iter()
        .copied()
        .filter(|c| !target_list.iter().any(|t| t.name == c.name))
        .map(|c| (c.name.to_string(), c))
        .collect();
    let mut target_only: Vec<(String, &CreateDatabase)> = target_list
        .iter()
        .copied()
        .filter(|t| !current_list.iter().any(|c| c.name == t.name))
        .map(|t| (t.name.to_string(), t))
        .collect();

    let renames = detect_renames(&mut current_only, &mut target_only, |a, b| databases_equal_except_name(a, b));

    let mut diffs = Vec::new();

    for (from, to) in &renames {
        let fwd = StatementKind::RenameDatabase(RenameDatabase {
            from:       Ident::new(from.clone()),
            to:         Ident::new(to.clone()),
            on_cluster: None
        });
        let rev = StatementKind::RenameDatabase(RenameDatabase {
            from:       Ident::new(to.clone()),
            to:         Ident::new(from.clone()),
            on_cluster: None
        });
        diffs.push(Diff::new(
            ObjectKind::Database,
            DiffKind::Rename,
            to.clone(),
            format!("rename database {from} to {to}"),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    for (name, db) in &current_only {
        let drop = StatementKind::DropDatabase(DropDatabase {
            name:       db.name.clone(),
            if_exists:  true,
            on_cluster: db.on_cluster.clone()
        });
        let create = StatementKind::CreateDatabase((*db).clone());
        diffs.push(Diff::new(
            ObjectKind::Database,
            DiffKind::Drop,
            name.clone(),
            format!("drop database {name}"),
            vec![render(drop)],
            vec![render(create)]
        ));
    }

    for (name, db) in &target_only {
        let create = StatementKind::CreateDatabase((*db).clone());
        let drop = StatementKind::DropDatabase(DropDatabase {
            name:       db.name.clone(),
            if_exists:  true,
            on_cluster: db.on_cluster.clone()
        });
        diffs.push(Diff::new(
            ObjectKind::Database,
            DiffKind::Create,
            name.clone(),
            format!("create database {name}"),
            vec![render(create)],
            vec![render(drop)]
        ));
    }

    for cur in &current_list {
        let Some(tgt) = target_list.iter().find(|t| t.name == cur.name) else { continue };
        if cur.engine != tgt.engine {
            return Err(unsupported_error(format!("engine change on database {}", cur.name)));
        }
        if cur.comment == tgt.comment {
            continue;
        }
        let fwd = StatementKind::AlterDatabase(AlterDatabase {
            name:       tgt.name.clone(),
            on_cluster: tgt.on_cluster.clone(),
            actions:    vec![AlterDatabaseAction::ModifyComment(tgt.comment.clone().unwrap_or_default())]
        });
        let rev = StatementKind::AlterDatabase(AlterDatabase {
            name:       cur.name.clone(),
            on_cluster: cur.on_cluster.clone(),
            actions:    vec![AlterDatabaseAction::ModifyComment(cur.comment.clone().unwrap_or_default())]
        });
        diffs.push(Diff::new(
            ObjectKind::Database,
            DiffKind::Alter,
            cur.name.to_string(),
            format!("alter database {}", cur.name),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    Ok(diffs)
}

// --- dictionaries ------------------------------------------------------------

fn collect_dictionaries(sql: &Sql) -> Vec<&CreateDictionary> {
    sql.statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::CreateDictionary(d) => Some(d),
            _ => None
        })
        .collect()
}

fn dictionaries_equal_except_name(a: &CreateDictionary, b: &CreateDictionary) -> bool {
    a.columns == b.columns
        && a.primary_key == b.primary_key
        && a.source == b.source
        && a.layout == b.layout
        && a.lifetime == b.lifetime
        && a.settings == b.settings
        && a.comment == b.comment
        && a.on_cluster == b.on_cluster
}

/// Dictionaries have no `ALTER`; any property change is a drop+create
/// pair reported as a single `Replace` diff.
fn diff_dictionaries(current: &Sql, target: &Sql) -> Vec<Diff> {
    let current_list = collect_dictionaries(current);
    let target_list = collect_dictionaries(target);

    let mut current_only: Vec<(String, &CreateDictionary)> = current_list
        .iter()
        .copied()
        .filter(|c| !target_list.iter().any(|t| t.name == c.name))
        .map(|c| (c.name.to_string(), c))
        .collect();
    let mut target_only: Vec<(String, &CreateDictionary)> = target_list
        .iter()
        .copied()
        .filter(|t| !current_list.iter().any(|c| c.name == t.name))
        .map(|t| (t.name.to_string(), t))
        .collect();

    let renames = detect_renames(&mut current_only, &mut target_only, |a, b| dictionaries_equal_except_name(a, b));

    let mut diffs = Vec::new();

    for (from, to) in &renames {
        let fwd = StatementKind::RenameDictionary(RenameDictionary {
            from:       parse_qualified(from),
            to:         parse_qualified(to),
            on_cluster: None
        });
        let rev = StatementKind::RenameDictionary(RenameDictionary {
            from:       parse_qualified(to),
            to:         parse_qualified(from),
            on_cluster: None
        });
        diffs.push(Diff::new(
            ObjectKind::Dictionary,
            DiffKind::Rename,
            to.clone(),
            format!("rename dictionary {from} to {to}"),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    for (name, dict) in &current_only {
        let drop = drop_dictionary_stmt(&dict.name, dict.on_cluster.clone());
        let create = StatementKind::CreateDictionary((*dict).clone());
        diffs.push(Diff::new(
            ObjectKind::Dictionary,
            DiffKind::Drop,
            name.clone(),
            format!("drop dictionary {name}"),
            vec![render(drop)],
            vec![render(create)]
        ));
    }

    for (name, dict) in &target_only {
        let create = StatementKind::CreateDictionary((*dict).clone());
        let drop = drop_dictionary_stmt(&dict.name, dict.on_cluster.clone());
        diffs.push(Diff::new(
            ObjectKind::Dictionary,
            DiffKind::Create,
            name.clone(),
            format!("create dictionary {name}"),
            vec![render(create)],
            vec![render(drop)]
        ));
    }

    for cur in &current_list {
        let Some(tgt) = target_list.iter().find(|t| t.name == cur.name) else { continue };
        if dictionaries_equal_except_name(cur, tgt) {
            continue;
        }
        let forward_sql = vec![
            render(drop_dictionary_stmt(&cur.name, cur.on_cluster.clone())),
            render(StatementKind::CreateDictionary((*tgt).clone())),
        ];
        let reverse_sql = vec![
            render(drop_dictionary_stmt(&tgt.name, tgt.on_cluster.clone())),
            render(StatementKind::CreateDictionary((*cur).clone())),
        ];
        diffs.push(Diff::new(
            ObjectKind::Dictionary,
            DiffKind::Replace,
            cur.name.to_string(),
            format!("replace dictionary {}", cur.name),
            forward_sql,
            reverse_sql
        ));
    }

    diffs
}

fn drop_dictionary_stmt(name: &QualifiedName, on_cluster: Option<Ident>) -> StatementKind {
    StatementKind::DropDictionary(DropDictionary { name: name.clone(), if_exists: true, on_cluster })
}

fn parse_qualified(s: &str) -> QualifiedName {
    match s.split_once('.') {
        Some((db, name)) => QualifiedName::qualified(db, name),
        None => QualifiedName::bare(s)
    }
}

// --- tables ------------------------------------------------------------------

fn collect_tables(sql: &Sql) -> Vec<&CreateTable> {
    sql.statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::CreateTable(t) => Some(t),
            _ => None
        })
        .collect()
}

fn tables_equal_except_name(a: &CreateTable, b: &CreateTable) -> bool {
    a.elements == b.elements && a.clauses == b.clauses && a.on_cluster == b.on_cluster
}

fn diff_tables(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let current_list = collect_tables(current);
    let target_list = collect_tables(target);

    let mut current_only: Vec<(String, &CreateTable)> = current_list
        .iter()
        .copied()
        .filter(|c| !target_list.iter().any(|t| t.name == c.name))
        .map(|c| (c.name.to_string(), c))
        .collect();
    let mut target_only: Vec<(String, &CreateTable)> = target_list
        .iter()
        .copied()
        .filter(|t| !current_list.iter().any(|c| c.name == t.name))
        .map(|t| (t.name.to_string(), t))
        .collect();

    let renames = detect_renames(&mut current_only, &mut target_only, |a, b| tables_equal_except_name(a, b));

    let mut diffs = Vec::new();

    for (from, to) in &renames {
        let fwd = StatementKind::RenameTable(RenameTable {
            from:       parse_qualified(from),
            to:         parse_qualified(to),
            on_cluster: None
        });
        let rev = StatementKind::RenameTable(RenameTable {
            from:       parse_qualified(to),
            to:         parse_qualified(from),
            on_cluster: None
        });
        diffs.push(Diff::new(
            ObjectKind::Table,
            DiffKind::Rename,
            to.clone(),
            format!("rename table {from} to {to}"),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    for (name, tbl) in &current_only {
        let drop = StatementKind::DropTable(DropTable {
            name:       tbl.name.clone(),
            if_exists:  true,
            on_cluster: tbl.on_cluster.clone()
        });
        let create = StatementKind::CreateTable((*tbl).clone());
        diffs.push(Diff::new(
            ObjectKind::Table,
            DiffKind::Drop,
            name.clone(),
            format!("drop table {name}"),
            vec![render(drop)],
            vec![render(create)]
        ));
    }

    for (name, tbl) in &target_only {
        let create = StatementKind::CreateTable((*tbl).clone());
        let drop = StatementKind::DropTable(DropTable {
            name:       tbl.name.clone(),
            if_exists:  true,
            on_cluster: tbl.on_cluster.clone()
        });
        diffs.push(Diff::new(
            ObjectKind::Table,
            DiffKind::Create,
            name.clone(),
            format!("create table {name}"),
            vec![render(create)],
            vec![render(drop)]
        ));
    }

    for cur in &current_list {
        let Some(tgt) = target_list.iter().find(|t| t.name == cur.name) else { continue };
        let forward_actions = table::diff_table_actions(cur, tgt)?;
        if forward_actions.is_empty() {
            continue;
        }
        // The reverse migration is synthesized by diffing in the other
        // direction — symmetric, so renames/adds/drops all invert correctly.
        let reverse_actions = table::diff_table_actions(tgt, cur)?;
        let fwd = StatementKind::AlterTable(AlterTable {
            name:       tgt.name.clone(),
            if_exists:  true,
            on_cluster: tgt.on_cluster.clone(),
            actions:    forward_actions
        });
        let rev = StatementKind::AlterTable(AlterTable {
            name:       cur.name.clone(),
            if_exists:  true,
            on_cluster: cur.on_cluster.clone(),
            actions:    reverse_actions
        });
        diffs.push(Diff::new(
            ObjectKind::Table,
            DiffKind::Alter,
            cur.name.to_string(),
            format!("alter table {}", cur.name),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    Ok(diffs)
}

// --- views & materialized views ----------------------------------------------

fn collect_views(sql: &Sql) -> Vec<&CreateView> {
    sql.statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::CreateView(v) => Some(v),
            _ => None
        })
        .collect()
}

fn collect_mviews(sql: &Sql) -> Vec<&CreateMaterializedView> {
    sql.statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::CreateMaterializedView(v) => Some(v),
            _ => None
        })
        .collect()
}

fn views_equal_except_name(a: &CreateView, b: &CreateView) -> bool {
    a.query == b.query && a.columns == b.columns && a.comment == b.comment && a.on_cluster == b.on_cluster
}

fn mviews_equal_except_name(a: &CreateMaterializedView, b: &CreateMaterializedView) -> bool {
    a.to == b.to
        && a.clauses == b.clauses
        && a.columns == b.columns
        && a.populate == b.populate
        && a.query == b.query
        && a.comment == b.comment
        && a.on_cluster == b.on_cluster
}

/// A materialized view's column list and table clauses are re-expressed
/// as an ephemeral [`CreateTable`] so its clause/column diff can reuse
/// [`table::diff_table_actions`] rather than re-deriving it.
fn mv_as_table(mv: &CreateMaterializedView) -> CreateTable {
    CreateTable {
        name:          mv.name.clone(),
        if_not_exists: mv.if_not_exists,
        on_cluster:    mv.on_cluster.clone(),
        elements:      mv.columns.clone().unwrap_or_default().into_iter().map(TableElement::Column).collect(),
        clauses:       mv.clauses.clone()
    }
}

fn diff_views(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let mut diffs = Vec::new();
    diffs.extend(diff_plain_views(current, target)?);
    diffs.extend(diff_materialized_views(current, target)?);
    Ok(diffs)
}

fn diff_plain_views(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let current_list = collect_views(current);
    let target_list = collect_views(target);

    let mut current_only: Vec<(String, &CreateView)> = current_list
        .iter()
        .copied()
        .filter(|c| !target_list.iter().any(|t| t.name == c.name))
        .map(|c| (c.name.to_string(), c))
        .collect();
    let mut target_only: Vec<(String, &CreateView)> = target_list
        .iter()
        .copied()
        .filter(|t| !current_list.iter().any(|c| c.name == t.name))
        .map(|t| (t.name.to_string(), t))
        .collect();

    let renames = detect_renames(&mut current_only, &mut target_only, |a, b| views_equal_except_name(a, b));

    let mut diffs = Vec::new();

    for (from, to) in &renames {
        let fwd = StatementKind::RenameView(RenameView {
            from:       parse_qualified(from),
            to:         parse_qualified(to),
            on_cluster: None
        });
        let rev = StatementKind::RenameView(RenameView {
            from:       parse_qualified(to),
            to:         parse_qualified(from),
            on_cluster: None
        });
        diffs.push(Diff::new(
            ObjectKind::View,
            DiffKind::Rename,
            to.clone(),
            format!("rename view {from} to {to}"),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    for (name, view) in &current_only {
        let drop = StatementKind::DropView(DropView {
            name:       view.name.clone(),
            if_exists:  true,
            on_cluster: view.on_cluster.clone()
        });
        let create = StatementKind::CreateView((*view).clone());
        diffs.push(Diff::new(
            ObjectKind::View,
            DiffKind::Drop,
            name.clone(),
            format!("drop view {name}"),
            vec![render(drop)],
            vec![render(create)]
        ));
    }

    for (name, view) in &target_only {
        let create = StatementKind::CreateView((*view).clone());
        let drop = StatementKind::DropView(DropView {
            name:       view.name.clone(),
            if_exists:  true,
            on_cluster: view.on_cluster.clone()
        });
        diffs.push(Diff::new(
            ObjectKind::View,
            DiffKind::Create,
            name.clone(),
            format!("create view {name}"),
            vec![render(create)],
            vec![render(drop)]
        ));
    }

    for cur in &current_list {
        let Some(tgt) = target_list.iter().find(|t| t.name == cur.name) else { continue };
        if cur.query == tgt.query && cur.comment == tgt.comment {
            continue;
        }
        let mut fwd_actions = Vec::new();
        let mut rev_actions = Vec::new();
        if cur.query != tgt.query {
            fwd_actions.push(AlterTableAction::ModifyQuery(tgt.query.clone()));
            rev_actions.push(AlterTableAction::ModifyQuery(cur.query.clone()));
        }
        if cur.comment != tgt.comment {
            fwd_actions.push(AlterTableAction::ModifyComment(tgt.comment.clone().unwrap_or_default()));
            rev_actions.push(AlterTableAction::ModifyComment(cur.comment.clone().unwrap_or_default()));
        }
        let fwd = StatementKind::AlterTable(AlterTable {
            name:       tgt.name.clone(),
            if_exists:  true,
            on_cluster: tgt.on_cluster.clone(),
            actions:    fwd_actions
        });
        let rev = StatementKind::AlterTable(AlterTable {
            name:       cur.name.clone(),
            if_exists:  true,
            on_cluster: cur.on_cluster.clone(),
            actions:    rev_actions
        });
        diffs.push(Diff::new(
            ObjectKind::View,
            DiffKind::Alter,
            cur.name.to_string(),
            format!("alter view {}", cur.name),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    Ok(diffs)
}

fn diff_materialized_views(current: &Sql, target: &Sql) -> Result<Vec<Diff>> {
    let current_list = collect_mviews(current);
    let target_list = collect_mviews(target);

    let mut current_only: Vec<(String, &CreateMaterializedView)> = current_list
        .iter()
        .copied()
        .filter(|c| !target_list.iter().any(|t| t.name == c.name))
        .map(|c| (c.name.to_string(), c))
        .collect();
    let mut target_only: Vec<(String, &CreateMaterializedView)> = target_list
        .iter()
        .copied()
        .filter(|t| !current_list.iter().any(|c| c.name == t.name))
        .map(|t| (t.name.to_string(), t))
        .collect();

    let renames = detect_renames(&mut current_only, &mut target_only, |a, b| mviews_equal_except_name(a, b));

    let mut diffs = Vec::new();

    for (from, to) in &renames {
        let fwd = StatementKind::RenameView(RenameView {
            from:       parse_qualified(from),
            to:         parse_qualified(to),
            on_cluster: None
        });
        let rev = StatementKind::RenameView(RenameView {
            from:       parse_qualified(to),
            to:         parse_qualified(from),
            on_cluster: None
        });
        diffs.push(Diff::new(
            ObjectKind::MaterializedView,
            DiffKind::Rename,
            to.clone(),
            format!("rename materialized view {from} to {to}"),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    for (name, mv) in &current_only {
        let drop = StatementKind::DropView(DropView {
            name:       mv.name.clone(),
            if_exists:  true,
            on_cluster: mv.on_cluster.clone()
        });
        let create = StatementKind::CreateMaterializedView((*mv).clone());
        diffs.push(Diff::new(
            ObjectKind::MaterializedView,
            DiffKind::Drop,
            name.clone(),
            format!("drop materialized view {name}"),
            vec![render(drop)],
            vec![render(create)]
        ));
    }

    for (name, mv) in &target_only {
        let create = StatementKind::CreateMaterializedView((*mv).clone());
        let drop = StatementKind::DropView(DropView {
            name:       mv.name.clone(),
            if_exists:  true,
            on_cluster: mv.on_cluster.clone()
        });
        diffs.push(Diff::new(
            ObjectKind::MaterializedView,
            DiffKind::Create,
            name.clone(),
            format!("create materialized view {name}"),
            vec![render(create)],
            vec![render(drop)]
        ));
    }

    for cur in &current_list {
        let Some(tgt) = target_list.iter().find(|t| t.name == cur.name) else { continue };
        if cur.to != tgt.to {
            return Err(unsupported_error(format!("target table change on materialized view {}", cur.name)));
        }
        let mut fwd_actions = table::diff_table_actions(&mv_as_table(cur), &mv_as_table(tgt))?;
        let mut rev_actions = table::diff_table_actions(&mv_as_table(tgt), &mv_as_table(cur))?;
        if cur.query != tgt.query {
            fwd_actions.push(AlterTableAction::ModifyQuery(tgt.query.clone()));
            rev_actions.push(AlterTableAction::ModifyQuery(cur.query.clone()));
        }
        if cur.comment != tgt.comment {
            fwd_actions.push(AlterTableAction::ModifyComment(tgt.comment.clone().unwrap_or_default()));
            rev_actions.push(AlterTableAction::ModifyComment(cur.comment.clone().unwrap_or_default()));
        }
        if fwd_actions.is_empty() {
            continue;
        }
        let fwd = StatementKind::AlterTable(AlterTable {
            name:       tgt.name.clone(),
            if_exists:  true,
            on_cluster: tgt.on_cluster.clone(),
            actions:    fwd_actions
        });
        let rev = StatementKind::AlterTable(AlterTable {
            name:       cur.name.clone(),
            if_exists:  true,
            on_cluster: cur.on_cluster.clone(),
            actions:    rev_actions
        });
        diffs.push(Diff::new(
            ObjectKind::MaterializedView,
            DiffKind::Alter,
            cur.name.to_string(),
            format!("alter materialized view {}", cur.name),
            vec![render(fwd)],
            vec![render(rev)]
        ));
    }

    Ok(diffs)
}

/// Names untouched by this diff, grouped by object kind — used by the
/// ordering-law test to confirm unrelated objects are left alone.
#[allow(dead_code)]
fn touched_identities(diffs: &[Diff]) -> HashSet<&str> {
    diffs.iter().map(|d| d.identity.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn sql(s: &str) -> Sql {
        parse(s).unwrap()
    }

    #[test]
    fn no_diff_is_an_error() {
        let a = sql("CREATE DATABASE x ENGINE=Atomic;");
        let err = diff_schema(&a, &a).unwrap_err();
        assert!(err.is_no_diff());
    }

    #[test]
    fn detects_database_rename() {
        let current = sql("CREATE DATABASE a ENGINE=Atomic;");
        let target = sql("CREATE DATABASE b ENGINE=Atomic;");
        let diffs = diff_schema(&current, &target).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].diff_kind, DiffKind::Rename);
        assert!(diffs[0].forward_sql[0].contains("RENAME DATABASE a TO b"));
    }

    #[test]
    fn add_column_round_trips_s1() {
        let current = sql("CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;");
        let target = sql("CREATE TABLE d.t (id UInt64, name String) ENGINE=MergeTree ORDER BY id;");
        let diffs = diff_schema(&current, &target).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].forward_sql, vec!["ALTER TABLE d.t ADD COLUMN name String;".to_string()]);
        assert_eq!(diffs[0].reverse_sql, vec!["ALTER TABLE d.t DROP COLUMN name;".to_string()]);
    }

    #[test]
    fn ordering_places_database_before_its_table() {
        let current = sql("CREATE DATABASE old ENGINE=Atomic;");
        let target = sql("CREATE DATABASE d ENGINE=Atomic;\nCREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;");
        let diffs = diff_schema(&current, &target).unwrap();
        let db_create = diffs.iter().position(|d| d.object_kind == ObjectKind::Database && d.diff_kind == DiffKind::Create).unwrap();
        let table_create = diffs.iter().position(|d| d.object_kind == ObjectKind::Table && d.diff_kind == DiffKind::Create).unwrap();
        let db_drop = diffs.iter().position(|d| d.object_kind == ObjectKind::Database && d.diff_kind == DiffKind::Drop).unwrap();
        assert!(db_create < table_create);
        assert!(table_create < db_drop);
    }
}
