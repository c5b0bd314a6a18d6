//! Table-level alter synthesis: the hardest differ subproblem (spec §4.3).
//!
//! Column-level diff matches by name, detects in-table renames by
//! position + type match among the name-unmatched remainder, and emits
//! the minimal set of `MODIFY COLUMN` / `REMOVE DEFAULT` / `CODEC` / `TTL`
//! / `COMMENT` statements for columns whose properties changed. Table-
//! level clause changes (`ENGINE`, `PARTITION BY`, `PRIMARY KEY`) that
//! ClickHouse cannot express as an in-place `ALTER` are refused with
//! [`HousekeeperError::Unsupported`].

use crate::{
    ast::{AlterTableAction, ColumnDef, CreateTable, TableElement},
    error::{Result, unsupported_error}
};

/// Produce the ordered `ALTER TABLE` action list that advances `current`
/// toward `target`, or `Err(Unsupported)` if the change requires
/// recreating the table.
pub fn diff_table_actions(current: &CreateTable, target: &CreateTable) -> Result<Vec<AlterTableAction>> {
    if current.clauses.engine != target.clauses.engine {
        return Err(unsupported_error(format!("engine change on table {}", target.name)));
    }
    if current.on_cluster != target.on_cluster {
        return Err(unsupported_error(format!("cluster change on table {}", target.name)));
    }
    if current.clauses.partition_by != target.clauses.partition_by {
        return Err(unsupported_error(format!("PARTITION BY change on table {}", target.name)));
    }
    if current.clauses.primary_key != target.clauses.primary_key {
        return Err(unsupported_error(format!("PRIMARY KEY change on table {}", target.name)));
    }

    let mut actions = Vec::new();
    actions.extend(diff_columns(current, target));
    actions.extend(diff_indexes(current, target));
    actions.extend(diff_constraints(current, target));
    actions.extend(diff_projections(current, target));
    actions.extend(diff_table_clauses(current, target));
    Ok(actions)
}

fn current_columns(t: &CreateTable) -> Vec<&ColumnDef> {
    t.elements.iter().filter_map(|e| e.as_column()).collect()
}

fn diff_columns(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableAction> {
    let current_cols = current_columns(current);
    let target_cols = current_columns(target);

    let matched_names: std::collections::HashSet<&str> =
        current_cols.iter().map(|c| c.name.as_str()).filter(|n| target_cols.iter().any(|t| t.name.as_str() == *n)).collect();

    let current_only: Vec<&ColumnDef> =
        current_cols.iter().copied().filter(|c| !matched_names.contains(c.name.as_str())).collect();
    let target_only: Vec<&ColumnDef> =
        target_cols.iter().copied().filter(|c| !matched_names.contains(c.name.as_str())).collect();

    // Rename detection: pair unmatched columns by position, requiring an
    // exact data-type match — a coincidental type match at a different
    // position is not treated as a rename.
    let mut renamed_from = std::collections::HashSet::new();
    let mut renamed_to = std::collections::HashSet::new();
    let mut actions = Vec::new();
    for (i, from) in current_only.iter().enumerate() {
        if let Some(to) = target_only.get(i) {
            if to.data_type == from.data_type {
                actions.push(AlterTableAction::RenameColumn { from: from.name.clone(), to: to.name.clone() });
                renamed_from.insert(from.name.clone());
                renamed_to.insert(to.name.clone());
            }
        }
    }

    for col in &current_only {
        if !renamed_from.contains(&col.name) {
            actions.push(AlterTableAction::DropColumn { name: col.name.clone() });
        }
    }

    let mut prev_target_name: Option<&str> = None;
    let last_index = target_cols.len().saturating_sub(1);
    for (i, col) in target_cols.iter().enumerate() {
        let is_new = target_only.iter().any(|t| t.name == col.name) && !renamed_to.contains(&col.name);
        if is_new {
            // ClickHouse appends to the end by default, so trailing adds
            // need no AFTER clause; only a mid-table insertion does.
            let (after, first) = if i == last_index {
                (None, false)
            } else if i == 0 {
                (None, true)
            } else {
                (prev_target_name.map(|n| n.into()), false)
            };
            actions.push(AlterTableAction::AddColumn { column: (*col).clone(), after, first });
        }
        prev_target_name = Some(col.name.as_str());
    }

    for col in target_cols.iter().copied() {
        let Some(prev) = current_cols.iter().copied().find(|c| c.name == col.name) else { continue };
        actions.extend(diff_column_properties(prev, col));
    }

    actions
}

fn diff_column_properties(current: &ColumnDef, target: &ColumnDef) -> Vec<AlterTableAction> {
    let mut actions = Vec::new();
    if !current.differs_excluding_name(target) {
        return actions;
    }
    if target.default_kind.is_none() && current.default_kind.is_some() {
        actions.push(AlterTableAction::ModifyColumnRemoveDefault { name: target.name.clone() });
    }
    if current.data_type != target.data_type
        || (target.default_kind.is_some()
            && (current.default_kind != target.default_kind || current.default_expr != target.default_expr))
    {
        actions.push(AlterTableAction::ModifyColumn {
            name:         target.name.clone(),
            data_type:    Some(target.data_type.clone()),
            default_kind: target.default_kind,
            default_expr: target.default_expr.clone(),
            comment:      None
        });
    }
    if current.codec != target.codec {
        if let Some(codec) = &target.codec {
            actions.push(AlterTableAction::ModifyColumnCodec { name: target.name.clone(), codec: codec.clone() });
        }
    }
    if current.ttl != target.ttl {
        if let Some(ttl) = &target.ttl {
            actions.push(AlterTableAction::ModifyColumnTtl { name: target.name.clone(), ttl: ttl.clone() });
        }
    }
    if current.comment != target.comment {
        actions.push(AlterTableAction::CommentColumn {
            name:    target.name.clone(),
            comment: target.comment.clone().unwrap_or_default()
        });
    }
    actions
}

fn diff_indexes(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableAction> {
    let current_idx: Vec<&crate::ast::IndexDef> = current.elements.iter().filter_map(as_index).collect();
    let target_idx: Vec<&crate::ast::IndexDef> = target.elements.iter().filter_map(as_index).collect();
    let mut actions = Vec::new();
    for idx in current_idx.iter().copied() {
        if !target_idx.iter().any(|t| t.name == idx.name) {
            actions.push(AlterTableAction::DropIndex { name: idx.name.clone() });
        }
    }
    let mut prev: Option<&str> = None;
    for idx in target_idx.iter().copied() {
        if !current_idx.iter().any(|c| *c == idx) {
            actions.push(AlterTableAction::AddIndex { index: idx.clone(), after: prev.map(|n| n.into()) });
        }
        prev = Some(idx.name.as_str());
    }
    actions
}

fn diff_constraints(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableAction> {
    let current_c: Vec<&crate::ast::ConstraintDef> = current.elements.iter().filter_map(as_constraint).collect();
    let target_c: Vec<&crate::ast::ConstraintDef> = target.elements.iter().filter_map(as_constraint).collect();
    let mut actions = Vec::new();
    for c in current_c.iter().copied() {
        if !target_c.iter().any(|t| t.name == c.name) {
            actions.push(AlterTableAction::DropConstraint { name: c.name.clone() });
        }
    }
    for c in target_c.iter().copied() {
        if !current_c.iter().any(|cur| *cur == c) {
            actions.push(AlterTableAction::AddConstraint { constraint: c.clone() });
        }
    }
    actions
}

fn diff_projections(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableAction> {
    let current_p: Vec<&crate::ast::ProjectionDef> = current.elements.iter().filter_map(as_projection).collect();
    let target_p: Vec<&crate::ast::ProjectionDef> = target.elements.iter().filter_map(as_projection).collect();
    let mut actions = Vec::new();
    for p in current_p.iter().copied() {
        if !target_p.iter().any(|t| t.name == p.name) {
            actions.push(AlterTableAction::DropProjection { name: p.name.clone() });
        }
    }
    for p in target_p.iter().copied() {
        if !current_p.iter().any(|cur| *cur == p) {
            actions.push(AlterTableAction::AddProjection { projection: p.clone() });
        }
    }
    actions
}

fn as_index(e: &TableElement) -> Option<&crate::ast::IndexDef> {
    match e {
        TableElement::Index(i) => Some(i),
        _ => None
    }
}

fn as_constraint(e: &TableElement) -> Option<&crate::ast::ConstraintDef> {
    match e {
        TableElement::Constraint(c) => Some(c),
        _ => None
    }
}

fn as_projection(e: &TableElement) -> Option<&crate::ast::ProjectionDef> {
    match e {
        TableElement::Projection(p) => Some(p),
        _ => None
    }
}

fn diff_table_clauses(current: &CreateTable, target: &CreateTable) -> Vec<AlterTableAction> {
    let mut actions = Vec::new();
    let (c, t) = (&current.clauses, &target.clauses);

    if c.order_by != t.order_by {
        actions.push(AlterTableAction::ModifyOrderBy { columns: t.order_by.clone() });
    }
    match (&c.sample_by, &t.sample_by) {
        (cur, tgt) if cur == tgt => {}
        (_, Some(expr)) => actions.push(AlterTableAction::ModifySampleBy { expr: expr.clone() }),
        (Some(_), None) => actions.push(AlterTableAction::RemoveSampleBy)
    }
    if c.ttl != t.ttl {
        if let Some(ttl) = &t.ttl {
            actions.push(AlterTableAction::ModifyTtl { ttl: ttl.clone() });
        }
    }
    for (name, value) in &t.settings {
        if c.settings.get(name) != Some(value) {
            actions.push(AlterTableAction::ModifySetting { name: name.clone(), value: value.clone() });
        }
    }
    for name in c.settings.keys() {
        if !t.settings.contains_key(name) {
            actions.push(AlterTableAction::ResetSetting { name: name.clone() });
        }
    }
    if c.comment != t.comment {
        actions.push(AlterTableAction::ModifyComment(t.comment.clone().unwrap_or_default()));
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn table(sql: &str) -> CreateTable {
        let parsed = parse(sql).unwrap();
        match parsed.statements.into_iter().next().unwrap().kind {
            crate::ast::StatementKind::CreateTable(t) => t,
            _ => panic!("not a CREATE TABLE")
        }
    }

    #[test]
    fn detects_added_column() {
        let current = table("CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;");
        let target = table("CREATE TABLE d.t (id UInt64, name String) ENGINE=MergeTree ORDER BY id;");
        let actions = diff_table_actions(&current, &target).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], AlterTableAction::AddColumn { column, .. } if column.name.as_str() == "name"));
    }

    #[test]
    fn refuses_engine_change() {
        let current = table("CREATE TABLE d.t (id UInt64) ENGINE=MergeTree ORDER BY id;");
        let target = table("CREATE TABLE d.t (id UInt64) ENGINE=ReplacingMergeTree ORDER BY id;");
        let err = diff_table_actions(&current, &target).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn detects_column_rename() {
        let current = table("CREATE TABLE d.t (id UInt64, old_name String) ENGINE=MergeTree ORDER BY id;");
        let target = table("CREATE TABLE d.t (id UInt64, new_name String) ENGINE=MergeTree ORDER BY id;");
        let actions = diff_table_actions(&current, &target).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], AlterTableAction::RenameColumn { from, to }
            if from.as_str() == "old_name" && to.as_str() == "new_name"));
    }
}
