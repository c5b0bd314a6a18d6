//! Renders a parsed [`crate::ast::Sql`] back to canonical ClickHouse DDL.
//!
//! Canonical form: uppercase keywords, two-space indentation inside
//! parenthesised column lists, identifiers backtick-quoted iff they are
//! reserved words or contain characters outside `[A-Za-z0-9_]` or start
//! with a digit, clauses emitted in a fixed order regardless of the order
//! they were parsed in. The formatter is the inverse of the parser up to
//! trivia normalization: `parse(format(parse(s))) == parse(s)`.

mod ddl;
mod expr;

pub use ddl::render_statement_kind;

use crate::ast::{Ident, QualifiedName, Sql, Statement, StatementKind};

/// Render a full parsed file back to SQL text, one statement per
/// paragraph, comments preserved.
pub fn format_sql(sql: &Sql) -> String {
    let mut out = String::new();
    for (i, stmt) in sql.statements.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&format_statement(stmt));
    }
    out.push('\n');
    out
}

/// Render one statement, including its attached comment trivia.
pub fn format_statement(stmt: &Statement) -> String {
    let mut out = String::new();
    for c in &stmt.leading_comments {
        out.push_str("-- ");
        out.push_str(c);
        out.push('\n');
    }
    if let StatementKind::CommentStatement(text) = &stmt.kind {
        out.push_str("-- ");
        out.push_str(text);
        return out;
    }
    out.push_str(&ddl::render_statement_kind(&stmt.kind));
    out.push(';');
    for (i, c) in stmt.trailing_comments.iter().enumerate() {
        if i == 0 {
            out.push_str(" -- ");
        } else {
            out.push_str("\n-- ");
        }
        out.push_str(c);
    }
    out
}

/// Backtick-quote `name` iff it is a reserved keyword or contains a
/// character outside `[A-Za-z0-9_]`, or starts with a digit.
pub fn quote_ident(name: &str) -> String {
    if needs_quoting(name) {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    } else {
        name.to_string()
    }
}

fn needs_quoting(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return true;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return true;
    }
    is_reserved(name)
}

fn is_reserved(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "ALL", "AND", "ANTI", "ANY", "ARRAY", "AS", "ASC", "ASOF", "BETWEEN", "BOTH", "BY", "CASE",
        "CAST", "COLLATE", "CROSS", "CUBE", "DESC", "DISTINCT", "ELSE", "END", "FINAL", "FOR",
        "FROM", "FULL", "GROUP", "HAVING", "IN", "INNER", "INTERVAL", "IS", "JOIN", "LEADING",
        "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PREWHERE",
        "RIGHT", "ROLLUP", "SAMPLE", "SELECT", "SEMI", "SETTINGS", "TABLE", "THEN", "TOTALS",
        "TRAILING", "UNION", "USING", "WHEN", "WHERE", "WITH", "TRUE", "FALSE"
    ];
    RESERVED.contains(&name.to_ascii_uppercase().as_str())
}

pub(crate) fn render_ident(ident: &Ident) -> String {
    quote_ident(ident.as_str())
}

pub(crate) fn render_qualified_name(name: &QualifiedName) -> String {
    match &name.database {
        Some(db) => format!("{}.{}", render_ident(db), render_ident(&name.name)),
        None => render_ident(&name.name)
    }
}

/// Two spaces per indent level, matching the teacher's parenthesised
/// column-list convention.
pub(crate) fn indent(level: usize) -> String {
    "  ".repeat(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_reserved_words() {
        assert_eq!(quote_ident("table"), "`table`");
        assert_eq!(quote_ident("TABLE"), "`TABLE`");
    }

    #[test]
    fn quotes_identifiers_with_special_characters() {
        assert_eq!(quote_ident("my-table"), "`my-table`");
        assert_eq!(quote_ident("9lives"), "`9lives`");
    }

    #[test]
    fn leaves_plain_identifiers_unquoted() {
        assert_eq!(quote_ident("events"), "events");
        assert_eq!(quote_ident("user_id"), "user_id");
    }
}
