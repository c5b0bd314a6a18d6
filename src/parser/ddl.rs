//! Per-statement-kind DDL parsers, dispatched from [`super::Parser::parse_all`].

use indexmap::IndexMap;

use super::{Parser, token::TokKind};
use crate::ast::{
    AlterDatabase, AlterDatabaseAction, AlterNamedCollection, AlterRole, AlterTable, AlterTableAction, AlterUser,
    AttachDatabase, AttachDictionary, AttachTable, AttachView, Codec, CodecPart, ColumnDef, ConstraintDef,
    CreateDatabase, CreateDictionary, CreateFunction, CreateMaterializedView, CreateNamedCollection, CreateRole,
    CreateTable, CreateUser, CreateView, DefaultKind, DetachDatabase, DetachDictionary, DetachTable, DetachView,
    DropDatabase, DropDictionary, DropFunction, DropNamedCollection, DropRole, DropTable, DropUser, DropView,
    EngineSpec, Expr, FromClause, FromSource, GrantRole, Ident, IndexDef, Join, JoinKind, LifetimeSpec,
    ProjectionDef, RenameDatabase, RenameDictionary, RenameTable, RenameView, RevokeRole, Select,
    SelectItem, SetRole, Statement, StatementKind, TableClauses, TableElement, TtlAction, TtlClause, TtlItem
};
use crate::error::Result;

pub(super) fn parse_statement_body(p: &mut Parser) -> Result<Statement> {
    let kind = if p.eat_keyword("CREATE") {
        parse_create(p)?
    } else if p.eat_keyword("ALTER") {
        parse_alter(p)?
    } else if p.eat_keyword("ATTACH") {
        parse_attach(p)?
    } else if p.eat_keyword("DETACH") {
        parse_detach(p)?
    } else if p.eat_keyword("DROP") {
        parse_drop(p)?
    } else if p.eat_keyword("RENAME") {
        parse_rename(p)?
    } else if p.eat_keyword("GRANT") {
        parse_grant(p)?
    } else if p.eat_keyword("REVOKE") {
        parse_revoke(p)?
    } else if p.eat_keyword("SET") {
        parse_set(p)?
    } else if p.is_keyword("SELECT") {
        StatementKind::Select(p.parse_select()?)
    } else {
        return Err(p.unexpected("a DDL statement"));
    };
    Ok(Statement::new(kind))
}

// --- CREATE ----------------------------------------------------------------

fn parse_create(p: &mut Parser) -> Result<StatementKind> {
    p.eat_keywords(&["OR", "REPLACE"]);
    if p.eat_keyword("DATABASE") {
        return parse_create_database(p);
    }
    if p.eat_keyword("TABLE") {
        return parse_create_table(p);
    }
    if p.eat_keyword("DICTIONARY") {
        return parse_create_dictionary(p);
    }
    if p.eat_keyword("MATERIALIZED") {
        p.expect_keyword("VIEW")?;
        return parse_create_materialized_view(p);
    }
    if p.eat_keyword("VIEW") {
        return parse_create_view(p);
    }
    if p.eat_keyword("ROLE") {
        return parse_create_role(p);
    }
    if p.eat_keyword("USER") {
        return parse_create_user(p);
    }
    if p.eat_keywords(&["NAMED", "COLLECTION"]) {
        return parse_create_named_collection(p);
    }
    if p.eat_keyword("FUNCTION") {
        return parse_create_function(p);
    }
    Err(p.unexpected("DATABASE, TABLE, DICTIONARY, VIEW, ROLE, USER, NAMED COLLECTION, or FUNCTION"))
}

fn parse_create_database(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.expect_ident()?;
    let on_cluster = p.parse_on_cluster()?;
    let engine = if p.eat_keyword("ENGINE") {
        p.expect_punct(TokKind::Eq)?;
        let f = p.parse_function_call()?;
        Some(EngineSpec { name: f.name, args: f.args })
    } else {
        None
    };
    let comment = parse_comment_clause(p)?;
    Ok(StatementKind::CreateDatabase(CreateDatabase { name, if_not_exists, on_cluster, engine, comment }))
}

fn parse_create_table(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.parse_qualified_name()?;
    let on_cluster = p.parse_on_cluster()?;
    let elements = p.parse_paren_list(|p| p.parse_table_element())?;
    let clauses = p.parse_table_clauses()?;
    Ok(StatementKind::CreateTable(CreateTable { name, if_not_exists, on_cluster, elements, clauses }))
}

fn parse_create_dictionary(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.parse_qualified_name()?;
    let on_cluster = p.parse_on_cluster()?;
    let columns = p.parse_paren_list(|p| p.parse_column_def())?;
    p.expect_keywords_or(&["PRIMARY", "KEY"])?;
    let primary_key = p.parse_comma_list(|p| p.expect_ident())?;
    p.expect_keyword("SOURCE")?;
    let source = p.parse_clause_call()?;
    p.expect_keyword("LAYOUT")?;
    let layout = p.parse_clause_call()?;
    p.expect_keyword("LIFETIME")?;
    let lifetime = p.parse_lifetime()?;
    let settings = p.parse_settings_map()?;
    let comment = parse_comment_clause(p)?;
    Ok(StatementKind::CreateDictionary(CreateDictionary {
        name,
        if_not_exists,
        on_cluster,
        columns,
        primary_key,
        source,
        layout,
        lifetime,
        settings,
        comment
    }))
}

fn parse_create_view(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.parse_qualified_name()?;
    let on_cluster = p.parse_on_cluster()?;
    let columns = if p.peek().kind == TokKind::LParen { Some(p.parse_paren_list(|p| p.expect_ident())?) } else { None };
    p.expect_keyword("AS")?;
    let query = p.parse_select()?;
    let comment = parse_comment_clause(p)?;
    Ok(StatementKind::CreateView(CreateView { name, if_not_exists, on_cluster, columns, query, comment }))
}

fn parse_create_materialized_view(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.parse_qualified_name()?;
    let on_cluster = p.parse_on_cluster()?;
    let to = if p.eat_keyword("TO") { Some(p.parse_qualified_name()?) } else { None };
    // a parenthesised list right after the name, before `TO`/`ENGINE`/`AS`,
    // can only be the explicit column list.
    let columns = if p.peek().kind == TokKind::LParen {
        Some(p.parse_paren_list(|p| p.parse_column_def())?)
    } else {
        None
    };
    let clauses = p.parse_table_clauses_partial()?;
    let populate = p.eat_keyword("POPULATE");
    p.expect_keyword("AS")?;
    let query = p.parse_select()?;
    let comment = parse_comment_clause(p)?;
    Ok(StatementKind::CreateMaterializedView(CreateMaterializedView {
        name,
        if_not_exists,
        on_cluster,
        to,
        clauses,
        columns,
        populate,
        query,
        comment
    }))
}

fn parse_create_role(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let names = p.parse_comma_list(|p| p.expect_ident())?;
    let on_cluster = p.parse_on_cluster()?;
    Ok(StatementKind::CreateRole(CreateRole { names, if_not_exists, on_cluster }))
}

fn parse_create_user(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.expect_ident()?;
    let on_cluster = p.parse_on_cluster()?;
    let mut identified_with = None;
    let mut identified_by = None;
    let mut hosts = None;
    if p.eat_keyword("IDENTIFIED") {
        if p.eat_keyword("WITH") {
            identified_with = Some(p.expect_ident()?.as_str().to_string());
        }
        if p.eat_keyword("BY") {
            identified_by = Some(p.expect_string()?);
        }
    }
    if p.eat_keyword("HOST") {
        hosts = Some(p.expect_ident()?.as_str().to_string());
    }
    Ok(StatementKind::CreateUser(CreateUser { name, if_not_exists, on_cluster, identified_with, identified_by, hosts }))
}

fn parse_create_named_collection(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.expect_ident()?;
    let on_cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;
    let settings = p.parse_kv_list()?;
    Ok(StatementKind::CreateNamedCollection(CreateNamedCollection { name, if_not_exists, on_cluster, settings }))
}

fn parse_create_function(p: &mut Parser) -> Result<StatementKind> {
    let if_not_exists = p.parse_if_not_exists();
    let name = p.expect_ident()?;
    let on_cluster = p.parse_on_cluster()?;
    p.expect_keyword("AS")?;
    let params = p.parse_paren_list(|p| p.expect_ident())?;
    p.expect_punct(TokKind::Arrow)?;
    let body = p.parse_expr()?;
    Ok(StatementKind::CreateFunction(CreateFunction { name, if_not_exists, on_cluster, params, body }))
}

// --- ALTER -------------------------------------------------------------------

fn parse_alter(p: &mut Parser) -> Result<StatementKind> {
    if p.eat_keyword("DATABASE") {
        return parse_alter_database(p);
    }
    if p.eat_keyword("TABLE") {
        return parse_alter_table(p);
    }
    if p.eat_keyword("ROLE") {
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::AlterRole(AlterRole { name, on_cluster }));
    }
    if p.eat_keyword("USER") {
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        let mut identified_with = None;
        let mut identified_by = None;
        if p.eat_keyword("IDENTIFIED") {
            if p.eat_keyword("WITH") {
                identified_with = Some(p.expect_ident()?.as_str().to_string());
            }
            if p.eat_keyword("BY") {
                identified_by = Some(p.expect_string()?);
            }
        }
        return Ok(StatementKind::AlterUser(AlterUser { name, on_cluster, identified_with, identified_by }));
    }
    if p.eat_keywords(&["NAMED", "COLLECTION"]) {
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        let set = if p.eat_keyword("SET") { p.parse_kv_list()? } else { IndexMap::new() };
        let delete = if p.eat_keyword("DELETE") {
            p.parse_comma_list(|p| Ok(p.expect_ident()?.as_str().to_string()))?
        } else {
            Vec::new()
        };
        return Ok(StatementKind::AlterNamedCollection(AlterNamedCollection { name, on_cluster, set, delete }));
    }
    Err(p.unexpected("DATABASE, TABLE, ROLE, USER, or NAMED COLLECTION"))
}

fn parse_alter_database(p: &mut Parser) -> Result<StatementKind> {
    let name = p.expect_ident()?;
    let on_cluster = p.parse_on_cluster()?;
    let mut actions = Vec::new();
    loop {
        if p.eat_keywords(&["MODIFY", "COMMENT"]) {
            actions.push(AlterDatabaseAction::ModifyComment(p.expect_string()?));
        } else if p.eat_keywords(&["MODIFY", "SETTING"]) {
            let name = p.expect_ident()?.as_str().to_string();
            p.expect_punct(TokKind::Eq)?;
            actions.push(AlterDatabaseAction::ModifySetting(name, p.parse_expr()?));
        } else {
            break;
        }
        if !p.eat_punct(TokKind::Comma) {
            break;
        }
    }
    Ok(StatementKind::AlterDatabase(AlterDatabase { name, on_cluster, actions }))
}

fn parse_alter_table(p: &mut Parser) -> Result<StatementKind> {
    let if_exists = p.parse_if_exists();
    let name = p.parse_qualified_name()?;
    let on_cluster = p.parse_on_cluster()?;
    let mut actions = Vec::new();
    loop {
        actions.push(p.parse_alter_table_action()?);
        if !p.eat_punct(TokKind::Comma) {
            break;
        }
    }
    Ok(StatementKind::AlterTable(AlterTable { name, if_exists, on_cluster, actions }))
}

impl Parser {
    fn parse_alter_table_action(&mut self) -> Result<AlterTableAction> {
        if self.eat_keyword("ADD") {
            if self.eat_keyword("COLUMN") {
                self.parse_if_not_exists();
                let column = self.parse_column_def()?;
                let (after, first) = self.parse_column_position()?;
                return Ok(AlterTableAction::AddColumn { column, after, first });
            }
            if self.eat_keyword("INDEX") {
                self.parse_if_not_exists();
                let index = self.parse_index_def()?;
                let after = if self.eat_keyword("AFTER") { Some(self.expect_ident()?) } else { None };
                return Ok(AlterTableAction::AddIndex { index, after });
            }
            if self.eat_keyword("CONSTRAINT") {
                self.parse_if_not_exists();
                let constraint = self.parse_constraint_def()?;
                return Ok(AlterTableAction::AddConstraint { constraint });
            }
            if self.eat_keyword("PROJECTION") {
                self.parse_if_not_exists();
                let projection = self.parse_projection_def()?;
                return Ok(AlterTableAction::AddProjection { projection });
            }
            return Err(self.unexpected("COLUMN, INDEX, CONSTRAINT, or PROJECTION"));
        }
        if self.eat_keyword("DROP") {
            if self.eat_keyword("COLUMN") {
                self.parse_if_exists();
                return Ok(AlterTableAction::DropColumn { name: self.expect_ident()? });
            }
            if self.eat_keyword("INDEX") {
                self.parse_if_exists();
                return Ok(AlterTableAction::DropIndex { name: self.expect_ident()? });
            }
            if self.eat_keyword("CONSTRAINT") {
                self.parse_if_exists();
                return Ok(AlterTableAction::DropConstraint { name: self.expect_ident()? });
            }
            if self.eat_keyword("PROJECTION") {
                self.parse_if_exists();
                return Ok(AlterTableAction::DropProjection { name: self.expect_ident()? });
            }
            return Err(self.unexpected("COLUMN, INDEX, CONSTRAINT, or PROJECTION"));
        }
        if self.eat_keyword("RENAME") {
            self.expect_keyword("COLUMN")?;
            self.parse_if_exists();
            let from = self.expect_ident()?;
            self.expect_keyword("TO")?;
            let to = self.expect_ident()?;
            return Ok(AlterTableAction::RenameColumn { from, to });
        }
        if self.eat_keyword("COMMENT") {
            if self.eat_keyword("COLUMN") {
                self.parse_if_exists();
                let name = self.expect_ident()?;
                let comment = self.expect_string()?;
                return Ok(AlterTableAction::CommentColumn { name, comment });
            }
            return Ok(AlterTableAction::ModifyComment(self.expect_string()?));
        }
        if self.eat_keyword("MODIFY") {
            if self.eat_keyword("COLUMN") {
                self.parse_if_exists();
                let name = self.expect_ident()?;
                if self.eat_keywords(&["REMOVE", "DEFAULT"]) {
                    return Ok(AlterTableAction::ModifyColumnRemoveDefault { name });
                }
                if self.eat_keyword("CODEC") {
                    let codec = self.parse_codec()?;
                    return Ok(AlterTableAction::ModifyColumnCodec { name, codec });
                }
                if self.eat_keyword("TTL") {
                    let ttl = self.parse_expr()?;
                    return Ok(AlterTableAction::ModifyColumnTtl { name, ttl });
                }
                if self.eat_keyword("COMMENT") {
                    let comment = self.expect_string()?;
                    return Ok(AlterTableAction::ModifyColumn {
                        name,
                        data_type: None,
                        default_kind: None,
                        default_expr: None,
                        comment: Some(comment)
                    });
                }
                let data_type = Some(self.parse_data_type()?);
                let (default_kind, default_expr) = self.parse_optional_default()?;
                let comment = if self.eat_keyword("COMMENT") { Some(self.expect_string()?) } else { None };
                return Ok(AlterTableAction::ModifyColumn { name, data_type, default_kind, default_expr, comment });
            }
            if self.eat_keyword("TTL") {
                let ttl = self.parse_ttl_clause()?;
                return Ok(AlterTableAction::ModifyTtl { ttl });
            }
            if self.eat_keywords(&["ORDER", "BY"]) {
                let columns = self.parse_order_by_columns()?;
                return Ok(AlterTableAction::ModifyOrderBy { columns });
            }
            if self.eat_keywords(&["SAMPLE", "BY"]) {
                return Ok(AlterTableAction::ModifySampleBy { expr: self.parse_expr()? });
            }
            if self.eat_keyword("SETTING") {
                let name = self.expect_ident()?.as_str().to_string();
                self.expect_punct(TokKind::Eq)?;
                return Ok(AlterTableAction::ModifySetting { name, value: self.parse_expr()? });
            }
            if self.eat_keyword("QUERY") {
                return Ok(AlterTableAction::ModifyQuery(self.parse_select()?));
            }
            return Err(self.unexpected("COLUMN, TTL, ORDER BY, SAMPLE BY, SETTING, or QUERY"));
        }
        if self.eat_keyword("RESET") {
            if self.eat_keyword("SETTING") {
                return Ok(AlterTableAction::ResetSetting { name: self.expect_ident()?.as_str().to_string() });
            }
            return Err(self.unexpected("SETTING"));
        }
        if self.eat_keywords(&["REMOVE", "SAMPLE", "BY"]) {
            return Ok(AlterTableAction::RemoveSampleBy);
        }
        Err(self.unexpected("an ALTER TABLE action"))
    }

    fn parse_column_position(&mut self) -> Result<(Option<Ident>, bool)> {
        if self.eat_keyword("FIRST") {
            return Ok((None, true));
        }
        if self.eat_keyword("AFTER") {
            return Ok((Some(self.expect_ident()?), false));
        }
        Ok((None, false))
    }

    fn parse_order_by_columns(&mut self) -> Result<Vec<Expr>> {
        if self.peek().kind == TokKind::LParen {
            self.parse_paren_list(|p| p.parse_expr())
        } else {
            self.parse_comma_list(|p| p.parse_expr())
        }
    }
}

// --- ATTACH / DETACH / DROP / RENAME ---------------------------------------

fn parse_attach(p: &mut Parser) -> Result<StatementKind> {
    if p.eat_keyword("DATABASE") {
        let if_not_exists = p.parse_if_not_exists();
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::AttachDatabase(AttachDatabase { name, if_not_exists, on_cluster }));
    }
    if p.eat_keyword("TABLE") {
        let if_not_exists = p.parse_if_not_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::AttachTable(AttachTable { name, if_not_exists, on_cluster }));
    }
    if p.eat_keyword("DICTIONARY") {
        let if_not_exists = p.parse_if_not_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::AttachDictionary(AttachDictionary { name, if_not_exists, on_cluster }));
    }
    p.eat_keyword("MATERIALIZED");
    if p.eat_keyword("VIEW") {
        let if_not_exists = p.parse_if_not_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::AttachView(AttachView { name, if_not_exists, on_cluster }));
    }
    Err(p.unexpected("DATABASE, TABLE, DICTIONARY, or VIEW"))
}

fn parse_detach(p: &mut Parser) -> Result<StatementKind> {
    if p.eat_keyword("DATABASE") {
        let if_exists = p.parse_if_exists();
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        let permanently = p.eat_keyword("PERMANENTLY");
        return Ok(StatementKind::DetachDatabase(DetachDatabase { name, if_exists, on_cluster, permanently }));
    }
    if p.eat_keyword("TABLE") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        let permanently = p.eat_keyword("PERMANENTLY");
        return Ok(StatementKind::DetachTable(DetachTable { name, if_exists, on_cluster, permanently }));
    }
    if p.eat_keyword("DICTIONARY") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        let permanently = p.eat_keyword("PERMANENTLY");
        return Ok(StatementKind::DetachDictionary(DetachDictionary { name, if_exists, on_cluster, permanently }));
    }
    p.eat_keyword("MATERIALIZED");
    if p.eat_keyword("VIEW") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        let permanently = p.eat_keyword("PERMANENTLY");
        return Ok(StatementKind::DetachView(DetachView { name, if_exists, on_cluster, permanently }));
    }
    Err(p.unexpected("DATABASE, TABLE, DICTIONARY, or VIEW"))
}

fn parse_drop(p: &mut Parser) -> Result<StatementKind> {
    if p.eat_keyword("DATABASE") {
        let if_exists = p.parse_if_exists();
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropDatabase(DropDatabase { name, if_exists, on_cluster }));
    }
    if p.eat_keyword("TABLE") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropTable(DropTable { name, if_exists, on_cluster }));
    }
    if p.eat_keyword("DICTIONARY") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropDictionary(DropDictionary { name, if_exists, on_cluster }));
    }
    if p.eat_keyword("ROLE") {
        let if_exists = p.parse_if_exists();
        let names = p.parse_comma_list(|p| p.expect_ident())?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropRole(DropRole { names, if_exists, on_cluster }));
    }
    if p.eat_keyword("USER") {
        let if_exists = p.parse_if_exists();
        let names = p.parse_comma_list(|p| p.expect_ident())?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropUser(DropUser { names, if_exists, on_cluster }));
    }
    if p.eat_keywords(&["NAMED", "COLLECTION"]) {
        let if_exists = p.parse_if_exists();
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropNamedCollection(DropNamedCollection { name, if_exists, on_cluster }));
    }
    if p.eat_keyword("FUNCTION") {
        let if_exists = p.parse_if_exists();
        let name = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropFunction(DropFunction { name, if_exists, on_cluster }));
    }
    p.eat_keyword("MATERIALIZED");
    if p.eat_keyword("VIEW") {
        let if_exists = p.parse_if_exists();
        let name = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::DropView(DropView { name, if_exists, on_cluster }));
    }
    Err(p.unexpected("DATABASE, TABLE, DICTIONARY, VIEW, ROLE, USER, NAMED COLLECTION, or FUNCTION"))
}

fn parse_rename(p: &mut Parser) -> Result<StatementKind> {
    if p.eat_keyword("DATABASE") {
        let from = p.expect_ident()?;
        p.expect_keyword("TO")?;
        let to = p.expect_ident()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::RenameDatabase(RenameDatabase { from, to, on_cluster }));
    }
    if p.eat_keyword("TABLE") {
        let from = p.parse_qualified_name()?;
        p.expect_keyword("TO")?;
        let to = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::RenameTable(RenameTable { from, to, on_cluster }));
    }
    if p.eat_keyword("DICTIONARY") {
        let from = p.parse_qualified_name()?;
        p.expect_keyword("TO")?;
        let to = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::RenameDictionary(RenameDictionary { from, to, on_cluster }));
    }
    p.eat_keyword("MATERIALIZED");
    if p.eat_keyword("VIEW") {
        let from = p.parse_qualified_name()?;
        p.expect_keyword("TO")?;
        let to = p.parse_qualified_name()?;
        let on_cluster = p.parse_on_cluster()?;
        return Ok(StatementKind::RenameView(RenameView { from, to, on_cluster }));
    }
    Err(p.unexpected("DATABASE, TABLE, DICTIONARY, or VIEW"))
}

fn parse_grant(p: &mut Parser) -> Result<StatementKind> {
    let roles = p.parse_comma_list(|p| p.expect_ident())?;
    p.expect_keyword("TO")?;
    let to = p.parse_comma_list(|p| p.expect_ident())?;
    let on_cluster = p.parse_on_cluster()?;
    Ok(StatementKind::GrantRole(GrantRole { roles, to, on_cluster }))
}

fn parse_revoke(p: &mut Parser) -> Result<StatementKind> {
    let roles = p.parse_comma_list(|p| p.expect_ident())?;
    p.expect_keyword("FROM")?;
    let from = p.parse_comma_list(|p| p.expect_ident())?;
    let on_cluster = p.parse_on_cluster()?;
    Ok(StatementKind::RevokeRole(RevokeRole { roles, from, on_cluster }))
}

fn parse_set(p: &mut Parser) -> Result<StatementKind> {
    let default = p.eat_keyword("DEFAULT");
    p.expect_keyword("ROLE")?;
    let roles = if p.eat_keyword("NONE") { Vec::new() } else { p.parse_comma_list(|p| p.expect_ident())? };
    Ok(StatementKind::SetRole(SetRole { roles, default }))
}

// --- shared building blocks --------------------------------------------------

impl Parser {
    pub(super) fn parse_select(&mut self) -> Result<Select> {
        self.expect_keyword("SELECT")?;
        let distinct = self.eat_keyword("DISTINCT");
        let mut columns = vec![self.parse_select_item()?];
        while self.eat_punct(TokKind::Comma) {
            columns.push(self.parse_select_item()?);
        }
        let from = if self.eat_keyword("FROM") { Some(self.parse_from_clause()?) } else { None };
        let where_ = if self.eat_keyword("WHERE") { Some(self.parse_expr()?) } else { None };
        let group_by = if self.eat_keywords(&["GROUP", "BY"]) { self.parse_comma_list(|p| p.parse_expr())? } else { Vec::new() };
        let having = if self.eat_keyword("HAVING") { Some(self.parse_expr()?) } else { None };
        let order_by = if self.eat_keywords(&["ORDER", "BY"]) { self.parse_order_by_items()? } else { Vec::new() };
        let limit = if self.eat_keyword("LIMIT") { Some(self.parse_expr()?) } else { None };
        let settings = if self.eat_keyword("SETTINGS") {
            self.parse_kv_list()?.into_iter().collect::<Vec<_>>()
        } else {
            Vec::new()
        };
        Ok(Select { distinct, columns, from, where_, group_by, having, order_by, limit, settings })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let expr = self.parse_expr()?;
        let alias = if self.eat_keyword("AS") { Some(self.expect_ident()?) } else { None };
        Ok(SelectItem { expr, alias })
    }

    fn parse_from_clause(&mut self) -> Result<FromClause> {
        let source = self.parse_from_source()?;
        let alias = self.parse_optional_alias()?;
        let mut joins = Vec::new();
        loop {
            let kind = if self.eat_keyword("CROSS") {
                self.expect_keyword("JOIN")?;
                JoinKind::Cross
            } else if self.eat_keyword("INNER") {
                self.expect_keyword("JOIN")?;
                JoinKind::Inner
            } else if self.eat_keyword("LEFT") {
                self.eat_keyword("OUTER");
                self.expect_keyword("JOIN")?;
                JoinKind::Left
            } else if self.eat_keyword("RIGHT") {
                self.eat_keyword("OUTER");
                self.expect_keyword("JOIN")?;
                JoinKind::Right
            } else if self.eat_keyword("FULL") {
                self.eat_keyword("OUTER");
                self.expect_keyword("JOIN")?;
                JoinKind::Full
            } else if self.eat_keyword("JOIN") {
                JoinKind::Inner
            } else {
                break;
            };
            let join_source = self.parse_from_source()?;
            let join_alias = self.parse_optional_alias()?;
            let on = if kind != JoinKind::Cross && self.eat_keyword("ON") { Some(self.parse_expr()?) } else { None };
            joins.push(Join { kind, source: join_source, alias: join_alias, on });
        }
        Ok(FromClause { source, alias, joins })
    }

    fn parse_from_source(&mut self) -> Result<FromSource> {
        if self.peek().kind == TokKind::LParen {
            self.advance();
            let select = self.parse_select()?;
            self.expect_punct(TokKind::RParen)?;
            return Ok(FromSource::Subquery(Box::new(select)));
        }
        Ok(FromSource::Table(self.parse_qualified_name()?))
    }

    fn parse_optional_alias(&mut self) -> Result<Option<Ident>> {
        if self.eat_keyword("AS") {
            return Ok(Some(self.expect_ident()?));
        }
        if matches!(self.peek().kind, TokKind::Ident(_))
            && !self.is_keyword("WHERE")
            && !self.is_keyword("JOIN")
            && !self.is_keyword("ON")
            && !self.is_keyword("GROUP")
            && !self.is_keyword("ORDER")
            && !self.is_keyword("HAVING")
            && !self.is_keyword("LIMIT")
            && !self.is_keyword("SETTINGS")
            && !self.is_keyword("INNER")
            && !self.is_keyword("LEFT")
            && !self.is_keyword("RIGHT")
            && !self.is_keyword("FULL")
            && !self.is_keyword("CROSS")
        {
            return Ok(Some(self.expect_ident()?));
        }
        Ok(None)
    }

    pub(super) fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_ident()?;
        let data_type = self.parse_data_type()?;
        let (default_kind, default_expr) = self.parse_optional_default()?;
        let codec = if self.eat_keyword("CODEC") { Some(self.parse_codec()?) } else { None };
        let ttl = if self.eat_keyword("TTL") { Some(self.parse_expr()?) } else { None };
        let comment = if self.eat_keyword("COMMENT") { Some(self.expect_string()?) } else { None };
        Ok(ColumnDef { name, data_type, default_kind, default_expr, codec, ttl, comment })
    }

    fn parse_optional_default(&mut self) -> Result<(Option<DefaultKind>, Option<Expr>)> {
        let kind = if self.eat_keyword("DEFAULT") {
            Some(DefaultKind::Default)
        } else if self.eat_keyword("MATERIALIZED") {
            Some(DefaultKind::Materialized)
        } else if self.eat_keyword("ALIAS") {
            Some(DefaultKind::Alias)
        } else if self.eat_keyword("EPHEMERAL") {
            Some(DefaultKind::Ephemeral)
        } else {
            None
        };
        if kind.is_none() {
            return Ok((None, None));
        }
        // `EPHEMERAL` may stand alone with no expression.
        let starts_expr = !matches!(self.peek().kind, TokKind::Comma | TokKind::RParen)
            && !self.is_keyword("CODEC")
            && !self.is_keyword("TTL")
            && !self.is_keyword("COMMENT");
        let expr = if starts_expr { Some(self.parse_expr()?) } else { None };
        Ok((kind, expr))
    }

    fn parse_table_element(&mut self) -> Result<TableElement> {
        if self.eat_keyword("INDEX") {
            return Ok(TableElement::Index(self.parse_index_def()?));
        }
        if self.eat_keyword("CONSTRAINT") {
            return Ok(TableElement::Constraint(self.parse_constraint_def()?));
        }
        if self.eat_keyword("PROJECTION") {
            return Ok(TableElement::Projection(self.parse_projection_def()?));
        }
        Ok(TableElement::Column(self.parse_column_def()?))
    }

    fn parse_index_def(&mut self) -> Result<IndexDef> {
        let name = self.expect_ident()?;
        let expr = self.parse_expr()?;
        self.expect_keyword("TYPE")?;
        let index_type = self.parse_function_call()?;
        self.expect_keyword("GRANULARITY")?;
        let granularity = Some(self.parse_expr()?);
        Ok(IndexDef { name, expr, index_type, granularity })
    }

    fn parse_constraint_def(&mut self) -> Result<ConstraintDef> {
        let name = self.expect_ident()?;
        self.expect_keyword("CHECK")?;
        let expr = self.parse_expr()?;
        Ok(ConstraintDef { name, expr })
    }

    fn parse_projection_def(&mut self) -> Result<ProjectionDef> {
        let name = self.expect_ident()?;
        self.expect_punct(TokKind::LParen)?;
        let query = self.parse_select()?;
        self.expect_punct(TokKind::RParen)?;
        Ok(ProjectionDef { name, query })
    }

    fn parse_codec(&mut self) -> Result<Codec> {
        let parts = self.parse_paren_list(|p| {
            let name = p.expect_ident()?.as_str().to_string();
            let args = if p.peek().kind == TokKind::LParen { p.parse_paren_list(|p| p.parse_expr())? } else { Vec::new() };
            Ok(CodecPart { name, args })
        })?;
        Ok(Codec { parts })
    }

    fn parse_ttl_clause(&mut self) -> Result<TtlClause> {
        let items = self.parse_comma_list(|p| {
            let expr = p.parse_expr()?;
            let action = if p.eat_keyword("DELETE") {
                Some(TtlAction::Delete)
            } else if p.eat_keywords(&["TO", "DISK"]) {
                Some(TtlAction::ToDisk(p.expect_string()?))
            } else if p.eat_keywords(&["TO", "VOLUME"]) {
                Some(TtlAction::ToVolume(p.expect_string()?))
            } else {
                None
            };
            Ok(TtlItem { expr, action })
        })?;
        Ok(TtlClause { items })
    }

    /// `SOURCE(...)`/`LAYOUT(...)` bodies use a space-separated `key value`
    /// grammar rather than the comma-separated argument lists used by
    /// `ENGINE =` and friends, e.g. `HTTP(url 'http://x' format 'CSV')`.
    fn parse_clause_call(&mut self) -> Result<crate::ast::FunctionCall> {
        self.expect_punct(TokKind::LParen)?;
        let call = self.parse_clause_call_body()?;
        self.expect_punct(TokKind::RParen)?;
        Ok(call)
    }

    fn parse_clause_call_body(&mut self) -> Result<crate::ast::FunctionCall> {
        let name = self.expect_ident()?.as_str().to_string();
        self.expect_punct(TokKind::LParen)?;
        let mut args = Vec::new();
        while self.peek().kind != TokKind::RParen {
            args.push(self.parse_clause_atom()?);
        }
        self.expect_punct(TokKind::RParen)?;
        Ok(crate::ast::FunctionCall { name, args, combinator_args: None })
    }

    fn parse_clause_atom(&mut self) -> Result<Expr> {
        if matches!(self.peek().kind, TokKind::Ident(_)) && self.peek_n(1).kind == TokKind::LParen {
            return Ok(Expr::Function(self.parse_clause_call_body()?));
        }
        match &self.peek().kind {
            TokKind::Str(_) => Ok(Expr::string(self.expect_string()?)),
            TokKind::Number(_) => Ok(Expr::number(self.expect_number()?)),
            TokKind::Ident(_) => Ok(Expr::ident(self.expect_ident()?.as_str().to_string())),
            _ => Err(self.unexpected("a key, value, or nested clause"))
        }
    }

    fn parse_lifetime(&mut self) -> Result<LifetimeSpec> {
        self.expect_punct(TokKind::LParen)?;
        let spec = if self.eat_keyword("MIN") {
            let min = self.expect_number()?.parse().ok();
            self.expect_keyword("MAX")?;
            let max = self.expect_number()?.parse().ok();
            LifetimeSpec { min, max }
        } else {
            let n: i64 = self.expect_number()?.parse().map_err(|_| self.unexpected("an integer"))?;
            LifetimeSpec { min: Some(0), max: Some(n) }
        };
        self.expect_punct(TokKind::RParen)?;
        Ok(spec)
    }

    /// Full table clause bag, in any source order, for `CREATE TABLE`.
    pub(super) fn parse_table_clauses(&mut self) -> Result<TableClauses> {
        let mut clauses = TableClauses::default();
        self.fill_table_clauses(&mut clauses)?;
        Ok(clauses)
    }

    /// Same, but every clause is optional and parsing stops at `AS` or
    /// `POPULATE` — used by `CREATE MATERIALIZED VIEW`.
    fn parse_table_clauses_partial(&mut self) -> Result<TableClauses> {
        let mut clauses = TableClauses::default();
        loop {
            if self.is_keyword("AS") || self.is_keyword("POPULATE") || self.at_statement_end() {
                break;
            }
            if !self.fill_one_table_clause(&mut clauses)? {
                break;
            }
        }
        Ok(clauses)
    }

    fn fill_table_clauses(&mut self, clauses: &mut TableClauses) -> Result<()> {
        loop {
            if self.at_statement_end() {
                break;
            }
            if !self.fill_one_table_clause(clauses)? {
                break;
            }
        }
        Ok(())
    }

    fn fill_one_table_clause(&mut self, clauses: &mut TableClauses) -> Result<bool> {
        if self.eat_keyword("ENGINE") {
            self.eat_punct(TokKind::Eq);
            let f = self.parse_function_call()?;
            clauses.engine = Some(EngineSpec { name: f.name, args: f.args });
        } else if self.eat_keywords(&["ORDER", "BY"]) {
            clauses.order_by = self.parse_order_by_columns()?;
        } else if self.eat_keywords(&["PARTITION", "BY"]) {
            clauses.partition_by = Some(self.parse_expr()?);
        } else if self.eat_keywords(&["PRIMARY", "KEY"]) {
            clauses.primary_key = Some(self.parse_order_by_columns()?);
        } else if self.eat_keywords(&["SAMPLE", "BY"]) {
            clauses.sample_by = Some(self.parse_expr()?);
        } else if self.eat_keyword("TTL") {
            clauses.ttl = Some(self.parse_ttl_clause()?);
        } else if self.eat_keyword("SETTINGS") {
            clauses.settings = self.parse_kv_list()?;
        } else if self.eat_keyword("COMMENT") {
            clauses.comment = Some(self.expect_string()?);
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek().kind, TokKind::Semicolon | TokKind::Eof)
    }

    fn parse_kv_list(&mut self) -> Result<IndexMap<String, Expr>> {
        let mut map = IndexMap::new();
        loop {
            let name = self.expect_ident()?.as_str().to_string();
            self.expect_punct(TokKind::Eq)?;
            let value = self.parse_expr()?;
            map.insert(name, value);
            if !self.eat_punct(TokKind::Comma) {
                break;
            }
        }
        Ok(map)
    }

    fn parse_settings_map(&mut self) -> Result<IndexMap<String, Expr>> {
        if self.eat_keyword("SETTINGS") { self.parse_kv_list() } else { Ok(IndexMap::new()) }
    }

    fn parse_comma_list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.eat_punct(TokKind::Comma) {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// `PRIMARY KEY (...)` for dictionaries doesn't accept the bare
    /// `PRIMARY KEY col` short form tables do, but we still funnel through
    /// `eat_keywords` for the common two-word phrase.
    fn expect_keywords_or(&mut self, words: &[&str]) -> Result<()> {
        if self.eat_keywords(words) {
            Ok(())
        } else {
            Err(self.unexpected(words.join(" ")))
        }
    }
}

fn parse_comment_clause(p: &mut Parser) -> Result<Option<String>> {
    if p.eat_keyword("COMMENT") { Ok(Some(p.expect_string()?)) } else { Ok(None) }
}

#[cfg(test)]
mod tests {
    use crate::ast::{AlterTableAction, StatementKind};
    use crate::parser::{parse, parse_statement};

    #[test]
    fn parses_create_database_with_engine_and_comment() {
        let stmt = parse_statement("CREATE DATABASE IF NOT EXISTS analytics ON CLUSTER prod ENGINE = Atomic COMMENT 'warehouse';").unwrap();
        let StatementKind::CreateDatabase(d) = stmt.kind else { panic!("expected CreateDatabase") };
        assert_eq!(d.name.as_str(), "analytics");
        assert!(d.if_not_exists);
        assert_eq!(d.on_cluster.unwrap().as_str(), "prod");
        assert_eq!(d.engine.unwrap().name, "Atomic");
        assert_eq!(d.comment.as_deref(), Some("warehouse"));
    }

    #[test]
    fn parses_create_table_with_full_clause_set() {
        let sql = "CREATE TABLE events (\
            id UInt64, \
            created_at DateTime DEFAULT now(), \
            payload String CODEC(ZSTD(3)) \
        ) ENGINE = MergeTree() \
          ORDER BY (id, created_at) \
          PARTITION BY toYYYYMM(created_at) \
          TTL created_at + INTERVAL 30 DAY \
          SETTINGS index_granularity = 8192;";
        let stmt = parse_statement(sql).unwrap();
        let StatementKind::CreateTable(t) = stmt.kind else { panic!("expected CreateTable") };
        assert_eq!(t.columns().count(), 3);
        assert_eq!(t.clauses.engine.unwrap().name, "MergeTree");
        assert_eq!(t.clauses.order_by.len(), 2);
        assert!(t.clauses.partition_by.is_some());
        assert!(t.clauses.ttl.is_some());
        assert_eq!(t.clauses.settings.get("index_granularity").unwrap(), &crate::ast::Expr::number("8192"));
    }

    #[test]
    fn parses_alter_table_multiple_actions() {
        let stmt = parse_statement("ALTER TABLE events ADD COLUMN note String, DROP COLUMN payload;").unwrap();
        let StatementKind::AlterTable(t) = stmt.kind else { panic!("expected AlterTable") };
        assert_eq!(t.actions.len(), 2);
        assert!(matches!(t.actions[0], AlterTableAction::AddColumn { .. }));
        assert!(matches!(t.actions[1], AlterTableAction::DropColumn { .. }));
    }

    #[test]
    fn parses_create_view_as_select() {
        let stmt = parse_statement("CREATE VIEW v AS SELECT id, name FROM users WHERE active = 1;").unwrap();
        let StatementKind::CreateView(v) = stmt.kind else { panic!("expected CreateView") };
        assert_eq!(v.query.columns.len(), 2);
        assert!(v.query.where_.is_some());
    }

    #[test]
    fn parses_create_dictionary() {
        let sql = "CREATE DICTIONARY d (id UInt64, name String) \
                   PRIMARY KEY id \
                   SOURCE(HTTP(url 'http://x')) \
                   LAYOUT(FLAT()) \
                   LIFETIME(MIN 0 MAX 300);";
        let stmt = parse_statement(sql).unwrap();
        let StatementKind::CreateDictionary(d) = stmt.kind else { panic!("expected CreateDictionary") };
        assert_eq!(d.columns.len(), 2);
        assert_eq!(d.primary_key.len(), 1);
        assert_eq!(d.lifetime.max, Some(300));
    }

    #[test]
    fn parses_drop_table_if_exists_on_cluster() {
        let stmt = parse_statement("DROP TABLE IF EXISTS db.t ON CLUSTER prod;").unwrap();
        let StatementKind::DropTable(d) = stmt.kind else { panic!("expected DropTable") };
        assert!(d.if_exists);
        assert_eq!(d.name.database.unwrap().as_str(), "db");
        assert_eq!(d.on_cluster.unwrap().as_str(), "prod");
    }

    #[test]
    fn parses_rename_table() {
        let stmt = parse_statement("RENAME TABLE old_t TO new_t;").unwrap();
        let StatementKind::RenameTable(r) = stmt.kind else { panic!("expected RenameTable") };
        assert_eq!(r.from.name.as_str(), "old_t");
        assert_eq!(r.to.name.as_str(), "new_t");
    }

    #[test]
    fn parses_multiple_statements_with_comments() {
        let sql = "-- first table\nCREATE TABLE a (id UInt64) ENGINE = Memory;\nCREATE TABLE b (id UInt64) ENGINE = Memory; -- second table\n";
        let sql = parse(sql).unwrap();
        assert_eq!(sql.statements.len(), 2);
        assert_eq!(sql.statements[0].leading_comments, vec!["first table".to_string()]);
        assert_eq!(sql.statements[1].trailing_comments, vec!["second table".to_string()]);
    }
}
