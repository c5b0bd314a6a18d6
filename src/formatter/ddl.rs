//! Renders every [`StatementKind`] variant to canonical SQL (sans the
//! trailing semicolon, which [`super::format_statement`] appends).

use super::{
    expr::{render_codec, render_data_type, render_expr, render_function_call, render_ttl_clause},
    indent, render_ident, render_qualified_name
};
use crate::ast::{
    AlterDatabaseAction, AlterTableAction, ColumnDef, DefaultKind, Expr, FromClause, FromSource,
    FunctionCall, Join, JoinKind, Literal, OrderByItem, Select, SelectItem, StatementKind,
    TableClauses, TableElement
};

pub fn render_statement_kind(kind: &StatementKind) -> String {
    match kind {
        StatementKind::CreateDatabase(s) => {
            let mut out = String::from("CREATE DATABASE");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if let Some(engine) = &s.engine {
                out.push_str(&format!(" ENGINE = {}", render_engine(&engine.name, &engine.args)));
            }
            push_comment(&mut out, s.comment.as_deref());
            out
        }
        StatementKind::AlterDatabase(s) => {
            let mut out = format!("ALTER DATABASE {}", render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            let actions: Vec<_> = s
                .actions
                .iter()
                .map(|a| match a {
                    AlterDatabaseAction::ModifyComment(c) => format!("MODIFY COMMENT '{c}'"),
                    AlterDatabaseAction::ModifySetting(name, value) => {
                        format!("MODIFY SETTING {name} = {}", render_expr(value))
                    }
                })
                .collect();
            out.push(' ');
            out.push_str(&actions.join(", "));
            out
        }
        StatementKind::AttachDatabase(s) => {
            let mut out = String::from("ATTACH DATABASE");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::DetachDatabase(s) => {
            let mut out = String::from("DETACH DATABASE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if s.permanently {
                out.push_str(" PERMANENTLY");
            }
            out
        }
        StatementKind::DropDatabase(s) => {
            let mut out = String::from("DROP DATABASE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::RenameDatabase(s) => {
            let mut out =
                format!("RENAME DATABASE {} TO {}", render_ident(&s.from), render_ident(&s.to));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateTable(s) => {
            let mut out = String::from("CREATE TABLE");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out.push_str(" (\n");
            let rows: Vec<_> = s.elements.iter().map(render_table_element).collect();
            out.push_str(&rows.iter().map(|r| format!("{}{}", indent(1), r)).collect::<Vec<_>>().join(",\n"));
            out.push_str("\n)");
            out.push_str(&render_table_clauses(&s.clauses));
            out
        }
        StatementKind::AlterTable(s) => {
            let mut out = String::from("ALTER TABLE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out.push(' ');
            let actions: Vec<_> = s.actions.iter().map(render_alter_table_action).collect();
            out.push_str(&actions.join(", "));
            out
        }
        StatementKind::AttachTable(s) => {
            let mut out = String::from("ATTACH TABLE");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::DetachTable(s) => {
            let mut out = String::from("DETACH TABLE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if s.permanently {
                out.push_str(" PERMANENTLY");
            }
            out
        }
        StatementKind::DropTable(s) => {
            let mut out = String::from("DROP TABLE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::RenameTable(s) => {
            let mut out = format!(
                "RENAME TABLE {} TO {}",
                render_qualified_name(&s.from),
                render_qualified_name(&s.to)
            );
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateDictionary(s) => {
            let mut out = String::from("CREATE DICTIONARY");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out.push_str(" (\n");
            let rows: Vec<_> = s.columns.iter().map(render_column_def).collect();
            out.push_str(&rows.iter().map(|r| format!("{}{}", indent(1), r)).collect::<Vec<_>>().join(",\n"));
            out.push_str("\n)");
            if !s.primary_key.is_empty() {
                out.push_str(&format!(
                    "\nPRIMARY KEY {}",
                    s.primary_key.iter().map(render_ident).collect::<Vec<_>>().join(", ")
                ));
            }
            out.push_str(&format!("\nSOURCE({})", render_clause_call(&s.source)));
            out.push_str(&format!("\nLAYOUT({})", render_clause_call(&s.layout)));
            out.push_str(&format!(
                "\nLIFETIME({})",
                match (s.lifetime.min, s.lifetime.max) {
                    (Some(min), Some(max)) if min != 0 => format!("MIN {min} MAX {max}"),
                    (_, Some(max)) => max.to_string(),
                    (Some(min), None) => format!("MIN {min} MAX 0"),
                    (None, None) => "0".to_string()
                }
            ));
            if !s.settings.is_empty() {
                out.push_str(&format!("\nSETTINGS {}", render_kv_list(&s.settings)));
            }
            push_comment(&mut out, s.comment.as_deref());
            out
        }
        StatementKind::AttachDictionary(s) => {
            let mut out = String::from("ATTACH DICTIONARY");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::DetachDictionary(s) => {
            let mut out = String::from("DETACH DICTIONARY");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if s.permanently {
                out.push_str(" PERMANENTLY");
            }
            out
        }
        StatementKind::DropDictionary(s) => {
            let mut out = String::from("DROP DICTIONARY");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::RenameDictionary(s) => {
            let mut out = format!(
                "RENAME DICTIONARY {} TO {}",
                render_qualified_name(&s.from),
                render_qualified_name(&s.to)
            );
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateView(s) => {
            let mut out = String::from("CREATE VIEW");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if let Some(columns) = &s.columns {
                out.push_str(&format!(
                    " ({})",
                    columns.iter().map(render_ident).collect::<Vec<_>>().join(", ")
                ));
            }
            out.push_str(" AS ");
            out.push_str(&render_select(&s.query));
            push_comment(&mut out, s.comment.as_deref());
            out
        }
        StatementKind::CreateMaterializedView(s) => {
            let mut out = String::from("CREATE MATERIALIZED VIEW");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if let Some(to) = &s.to {
                out.push_str(&format!(" TO {}", render_qualified_name(to)));
            }
            if let Some(columns) = &s.columns {
                out.push_str(" (\n");
                let rows: Vec<_> = columns.iter().map(render_column_def).collect();
                out.push_str(
                    &rows.iter().map(|r| format!("{}{}", indent(1), r)).collect::<Vec<_>>().join(",\n")
                );
                out.push_str("\n)");
            }
            out.push_str(&render_table_clauses(&s.clauses));
            if s.populate {
                out.push_str(" POPULATE");
            }
            out.push_str(" AS ");
            out.push_str(&render_select(&s.query));
            push_comment(&mut out, s.comment.as_deref());
            out
        }
        StatementKind::AttachView(s) => {
            let mut out = String::from("ATTACH VIEW");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::DetachView(s) => {
            let mut out = String::from("DETACH VIEW");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if s.permanently {
                out.push_str(" PERMANENTLY");
            }
            out
        }
        StatementKind::DropView(s) => {
            let mut out = String::from("DROP VIEW");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_qualified_name(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::RenameView(s) => {
            let mut out = format!(
                "RENAME VIEW {} TO {}",
                render_qualified_name(&s.from),
                render_qualified_name(&s.to)
            );
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateRole(s) => {
            let mut out = String::from("CREATE ROLE");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&s.names.iter().map(render_ident).collect::<Vec<_>>().join(", "));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::AlterRole(s) => {
            let mut out = format!("ALTER ROLE {}", render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::DropRole(s) => {
            let mut out = String::from("DROP ROLE");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&s.names.iter().map(render_ident).collect::<Vec<_>>().join(", "));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::GrantRole(s) => {
            let mut out = format!(
                "GRANT {} TO {}",
                s.roles.iter().map(render_ident).collect::<Vec<_>>().join(", "),
                s.to.iter().map(render_ident).collect::<Vec<_>>().join(", ")
            );
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::RevokeRole(s) => {
            let mut out = format!(
                "REVOKE {} FROM {}",
                s.roles.iter().map(render_ident).collect::<Vec<_>>().join(", "),
                s.from.iter().map(render_ident).collect::<Vec<_>>().join(", ")
            );
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }
        StatementKind::SetRole(s) => {
            let roles = if s.roles.is_empty() {
                "NONE".to_string()
            } else {
                s.roles.iter().map(render_ident).collect::<Vec<_>>().join(", ")
            };
            if s.default { format!("SET DEFAULT ROLE {roles}") } else { format!("SET ROLE {roles}") }
        }

        StatementKind::CreateUser(s) => {
            let mut out = String::from("CREATE USER");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if let (Some(with), Some(by)) = (&s.identified_with, &s.identified_by) {
                out.push_str(&format!(" IDENTIFIED WITH {with} BY '{by}'"));
            }
            if let Some(hosts) = &s.hosts {
                out.push_str(&format!(" HOST {hosts}"));
            }
            out
        }
        StatementKind::AlterUser(s) => {
            let mut out = format!("ALTER USER {}", render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if let (Some(with), Some(by)) = (&s.identified_with, &s.identified_by) {
                out.push_str(&format!(" IDENTIFIED WITH {with} BY '{by}'"));
            }
            out
        }
        StatementKind::DropUser(s) => {
            let mut out = String::from("DROP USER");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&s.names.iter().map(render_ident).collect::<Vec<_>>().join(", "));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateNamedCollection(s) => {
            let mut out = String::from("CREATE NAMED COLLECTION");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out.push_str(&format!(" AS {}", render_kv_list(&s.settings)));
            out
        }
        StatementKind::AlterNamedCollection(s) => {
            let mut out = format!("ALTER NAMED COLLECTION {}", render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            if !s.set.is_empty() {
                out.push_str(&format!(" SET {}", render_kv_list(&s.set)));
            }
            if !s.delete.is_empty() {
                out.push_str(&format!(" DELETE {}", s.delete.join(", ")));
            }
            out
        }
        StatementKind::DropNamedCollection(s) => {
            let mut out = String::from("DROP NAMED COLLECTION");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::CreateFunction(s) => {
            let mut out = String::from("CREATE FUNCTION");
            if s.if_not_exists {
                out.push_str(" IF NOT EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out.push_str(&format!(
                " AS ({}) -> {}",
                s.params.iter().map(render_ident).collect::<Vec<_>>().join(", "),
                render_expr(&s.body)
            ));
            out
        }
        StatementKind::DropFunction(s) => {
            let mut out = String::from("DROP FUNCTION");
            if s.if_exists {
                out.push_str(" IF EXISTS");
            }
            out.push(' ');
            out.push_str(&render_ident(&s.name));
            push_cluster(&mut out, s.on_cluster.as_ref());
            out
        }

        StatementKind::Select(select) => render_select(select),
        StatementKind::CommentStatement(text) => format!("-- {text}")
    }
}

fn render_engine(name: &str, args: &[crate::ast::Expr]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{name}({})", args.iter().map(render_expr).collect::<Vec<_>>().join(", "))
    }
}

/// SOURCE/LAYOUT bodies use ClickHouse's space-separated key/value clause
/// grammar, not the comma-separated expression list ordinary calls use.
fn render_clause_call(call: &FunctionCall) -> String {
    format!("{}({})", call.name, call.args.iter().map(render_clause_atom).collect::<Vec<_>>().join(" "))
}

fn render_clause_atom(e: &Expr) -> String {
    match e {
        Expr::Function(inner) => render_clause_call(inner),
        Expr::Literal(Literal::String(s)) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Expr::Literal(Literal::Number(n)) => n.clone(),
        Expr::Identifier(id) => id.as_str().to_string(),
        _ => render_expr(e)
    }
}

fn render_kv_list(map: &indexmap::IndexMap<String, crate::ast::Expr>) -> String {
    map.iter().map(|(k, v)| format!("{k} = {}", render_expr(v))).collect::<Vec<_>>().join(", ")
}

fn push_cluster(out: &mut String, cluster: Option<&crate::ast::Ident>) {
    if let Some(c) = cluster {
        out.push_str(&format!(" ON CLUSTER {}", render_ident(c)));
    }
}

fn push_comment(out: &mut String, comment: Option<&str>) {
    if let Some(c) = comment {
        out.push_str(&format!(" COMMENT '{c}'"));
    }
}

fn render_column_def(c: &ColumnDef) -> String {
    let mut out = format!("{} {}", render_ident(&c.name), render_data_type(&c.data_type));
    if let Some(kind) = c.default_kind {
        out.push(' ');
        out.push_str(match kind {
            DefaultKind::Default => "DEFAULT",
            DefaultKind::Materialized => "MATERIALIZED",
            DefaultKind::Alias => "ALIAS",
            DefaultKind::Ephemeral => "EPHEMERAL"
        });
        if let Some(expr) = &c.default_expr {
            out.push(' ');
            out.push_str(&render_expr(expr));
        }
    }
    if let Some(codec) = &c.codec {
        out.push(' ');
        out.push_str(&render_codec(codec));
    }
    if let Some(ttl) = &c.ttl {
        out.push_str(&format!(" TTL {}", render_expr(ttl)));
    }
    if let Some(comment) = &c.comment {
        out.push_str(&format!(" COMMENT '{comment}'"));
    }
    out
}

fn render_table_element(e: &TableElement) -> String {
    match e {
        TableElement::Column(c) => render_column_def(c),
        TableElement::Index(i) => format!(
            "INDEX {} {} TYPE {}{}",
            render_ident(&i.name),
            render_expr(&i.expr),
            render_function_call(&i.index_type),
            match &i.granularity {
                Some(g) => format!(" GRANULARITY {}", render_expr(g)),
                None => String::new()
            }
        ),
        TableElement::Constraint(c) => format!("CONSTRAINT {} CHECK {}", render_ident(&c.name), render_expr(&c.expr)),
        TableElement::Projection(p) => {
            format!("PROJECTION {} ({})", render_ident(&p.name), render_select(&p.query))
        }
    }
}

fn render_table_clauses(clauses: &TableClauses) -> String {
    let mut out = String::new();
    if let Some(engine) = &clauses.engine {
        out.push_str(&format!("\nENGINE = {}", render_engine(&engine.name, &engine.args)));
    }
    if !clauses.order_by.is_empty() {
        out.push_str(&format!(
            "\nORDER BY ({})",
            clauses.order_by.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(expr) = &clauses.partition_by {
        out.push_str(&format!("\nPARTITION BY {}", render_expr(expr)));
    }
    if let Some(pk) = &clauses.primary_key {
        out.push_str(&format!(
            "\nPRIMARY KEY ({})",
            pk.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(expr) = &clauses.sample_by {
        out.push_str(&format!("\nSAMPLE BY {}", render_expr(expr)));
    }
    if let Some(ttl) = &clauses.ttl {
        out.push_str(&format!("\nTTL {}", render_ttl_clause(ttl)));
    }
    if !clauses.settings.is_empty() {
        out.push_str(&format!("\nSETTINGS {}", render_kv_list(&clauses.settings)));
    }
    if let Some(comment) = &clauses.comment {
        out.push_str(&format!("\nCOMMENT '{comment}'"));
    }
    out
}

fn render_alter_table_action(a: &AlterTableAction) -> String {
    match a {
        AlterTableAction::AddColumn { column, after, first } => {
            let mut s = format!("ADD COLUMN {}", render_column_def(column));
            if *first {
                s.push_str(" FIRST");
            } else if let Some(after) = after {
                s.push_str(&format!(" AFTER {}", render_ident(after)));
            }
            s
        }
        AlterTableAction::DropColumn { name } => format!("DROP COLUMN {}", render_ident(name)),
        AlterTableAction::RenameColumn { from, to } => {
            format!("RENAME COLUMN {} TO {}", render_ident(from), render_ident(to))
        }
        AlterTableAction::ModifyColumn { name, data_type, default_kind, default_expr, comment } => {
            let mut s = format!("MODIFY COLUMN {}", render_ident(name));
            if let Some(dt) = data_type {
                s.push(' ');
                s.push_str(&render_data_type(dt));
            }
            if let Some(kind) = default_kind {
                s.push(' ');
                s.push_str(match kind {
                    DefaultKind::Default => "DEFAULT",
                    DefaultKind::Materialized => "MATERIALIZED",
                    DefaultKind::Alias => "ALIAS",
                    DefaultKind::Ephemeral => "EPHEMERAL"
                });
                if let Some(e) = default_expr {
                    s.push(' ');
                    s.push_str(&render_expr(e));
                }
            }
            if let Some(c) = comment {
                s.push_str(&format!(" COMMENT '{c}'"));
            }
            s
        }
        AlterTableAction::ModifyColumnRemoveDefault { name } => {
            format!("MODIFY COLUMN {} REMOVE DEFAULT", render_ident(name))
        }
        AlterTableAction::CommentColumn { name, comment } => {
            format!("COMMENT COLUMN {} '{comment}'", render_ident(name))
        }
        AlterTableAction::ModifyColumnCodec { name, codec } => {
            format!("MODIFY COLUMN {} {}", render_ident(name), render_codec(codec))
        }
        AlterTableAction::ModifyColumnTtl { name, ttl } => {
            format!("MODIFY COLUMN {} TTL {}", render_ident(name), render_expr(ttl))
        }
        AlterTableAction::AddIndex { index, after } => {
            let mut s = format!(
                "ADD INDEX {} {} TYPE {}{}",
                render_ident(&index.name),
                render_expr(&index.expr),
                render_function_call(&index.index_type),
                match &index.granularity {
                    Some(g) => format!(" GRANULARITY {}", render_expr(g)),
                    None => String::new()
                }
            );
            if let Some(after) = after {
                s.push_str(&format!(" AFTER {}", render_ident(after)));
            }
            s
        }
        AlterTableAction::DropIndex { name } => format!("DROP INDEX {}", render_ident(name)),
        AlterTableAction::AddConstraint { constraint } => {
            format!("ADD CONSTRAINT {} CHECK {}", render_ident(&constraint.name), render_expr(&constraint.expr))
        }
        AlterTableAction::DropConstraint { name } => format!("DROP CONSTRAINT {}", render_ident(name)),
        AlterTableAction::AddProjection { projection } => {
            format!("ADD PROJECTION {} ({})", render_ident(&projection.name), render_select(&projection.query))
        }
        AlterTableAction::DropProjection { name } => format!("DROP PROJECTION {}", render_ident(name)),
        AlterTableAction::ModifyTtl { ttl } => format!("MODIFY TTL {}", render_ttl_clause(ttl)),
        AlterTableAction::ModifyOrderBy { columns } => {
            format!("MODIFY ORDER BY ({})", columns.iter().map(render_expr).collect::<Vec<_>>().join(", "))
        }
        AlterTableAction::ModifySampleBy { expr } => format!("MODIFY SAMPLE BY {}", render_expr(expr)),
        AlterTableAction::RemoveSampleBy => "REMOVE SAMPLE BY".to_string(),
        AlterTableAction::ModifySetting { name, value } => format!("MODIFY SETTING {name} = {}", render_expr(value)),
        AlterTableAction::ResetSetting { name } => format!("RESET SETTING {name}"),
        AlterTableAction::ModifyComment(c) => format!("MODIFY COMMENT '{c}'"),
        AlterTableAction::ModifyQuery(select) => format!("MODIFY QUERY {}", render_select(select))
    }
}

pub fn render_select(select: &Select) -> String {
    let mut out = String::from("SELECT");
    if select.distinct {
        out.push_str(" DISTINCT");
    }
    out.push(' ');
    out.push_str(&select.columns.iter().map(render_select_item).collect::<Vec<_>>().join(", "));
    if let Some(from) = &select.from {
        out.push_str(&format!(" FROM {}", render_from_clause(from)));
    }
    if let Some(where_) = &select.where_ {
        out.push_str(&format!(" WHERE {}", render_expr(where_)));
    }
    if !select.group_by.is_empty() {
        out.push_str(&format!(
            " GROUP BY {}",
            select.group_by.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(having) = &select.having {
        out.push_str(&format!(" HAVING {}", render_expr(having)));
    }
    if !select.order_by.is_empty() {
        out.push_str(&format!(" ORDER BY {}", render_order_by_items(&select.order_by)));
    }
    if let Some(limit) = &select.limit {
        out.push_str(&format!(" LIMIT {}", render_expr(limit)));
    }
    if !select.settings.is_empty() {
        out.push_str(&format!(
            " SETTINGS {}",
            select.settings.iter().map(|(k, v)| format!("{k} = {}", render_expr(v))).collect::<Vec<_>>().join(", ")
        ));
    }
    out
}

fn render_select_item(item: &SelectItem) -> String {
    match &item.alias {
        Some(alias) => format!("{} AS {}", render_expr(&item.expr), render_ident(alias)),
        None => render_expr(&item.expr)
    }
}

fn render_from_clause(from: &FromClause) -> String {
    let mut out = render_from_source(&from.source);
    if let Some(alias) = &from.alias {
        out.push_str(&format!(" AS {}", render_ident(alias)));
    }
    for join in &from.joins {
        out.push(' ');
        out.push_str(&render_join(join));
    }
    out
}

fn render_from_source(source: &FromSource) -> String {
    match source {
        FromSource::Table(name) => render_qualified_name(name),
        FromSource::Subquery(select) => format!("({})", render_select(select))
    }
}

fn render_join(join: &Join) -> String {
    let kind = match join.kind {
        JoinKind::Inner => "INNER JOIN",
        JoinKind::Left => "LEFT JOIN",
        JoinKind::Right => "RIGHT JOIN",
        JoinKind::Full => "FULL JOIN",
        JoinKind::Cross => "CROSS JOIN"
    };
    let mut out = format!("{kind} {}", render_from_source(&join.source));
    if let Some(alias) = &join.alias {
        out.push_str(&format!(" AS {}", render_ident(alias)));
    }
    if let Some(on) = &join.on {
        out.push_str(&format!(" ON {}", render_expr(on)));
    }
    out
}

pub fn render_order_by_items(items: &[OrderByItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mut s = render_expr(&item.expr);
            if item.desc {
                s.push_str(" DESC");
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}
