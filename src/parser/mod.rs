//! Recursive-descent parser for ClickHouse DDL.
//!
//! [`parse`] turns SQL text into an [`crate::ast::Sql`]; [`parse_statement`]
//! parses exactly one statement. Parsing never returns a partial AST: any
//! failure is fatal and surfaces a position-qualified [`crate::error::HousekeeperError::Parse`].

mod cluster;
mod ddl;
mod expr;
mod lexer;
mod token;

pub use cluster::inject_on_cluster;

use crate::ast::{Sql, Statement, StatementKind};
use crate::error::{HousekeeperError, Result, parse_error};
use lexer::Lexer;
use token::{TokKind, Token};

/// Parse a full SQL file into an ordered list of statements.
pub fn parse(text: &str) -> Result<Sql> {
    let tokens = Lexer::tokenize(text)?;
    let mut parser = Parser::new(tokens);
    parser.parse_all()
}

/// Parse a single statement. Errors if more than one statement is present.
pub fn parse_statement(text: &str) -> Result<Statement> {
    let sql = parse(text)?;
    let mut stmts = sql.statements;
    match stmts.len() {
        1 => Ok(stmts.remove(0)),
        0 => Err(parse_error(1, 1, "a statement", "end of input")),
        n => Err(parse_error(1, 1, "exactly one statement", format!("{n} statements")))
    }
}

pub(crate) struct Comment {
    pub text:       String,
    pub start_line: usize,
    pub end_line:   usize
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos:    usize
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_all(&mut self) -> Result<Sql> {
        let mut statements = Vec::new();
        let mut prev_stmt_end_line: Option<usize> = None;

        loop {
            let comments = self.collect_comments();

            if self.at_eof() {
                if !comments.is_empty() {
                    let (_trailing, leading) = split_trailing(&comments, prev_stmt_end_line);
                    if !leading.is_empty() {
                        statements.push(Statement::new(StatementKind::CommentStatement(
                            join_comments(&leading)
                        )));
                    }
                }
                break;
            }

            let next_line = self.peek().line;
            let (trailing, leading) = split_trailing(&comments, prev_stmt_end_line);

            if let (Some(stmt), true) = (statements.last_mut(), !trailing.is_empty()) {
                let stmt: &mut Statement = stmt;
                stmt.trailing_comments.push(join_comments(&trailing));
            }

            // Comments separated from both the previous statement and the
            // upcoming one by a blank line become orphan comment statements.
            let (orphans, adjacent_leading) = split_adjacent(&leading, next_line);
            for orphan in orphans {
                statements.push(Statement::new(StatementKind::CommentStatement(orphan)));
            }

            let mut stmt = ddl::parse_statement_body(self)?;
            stmt.leading_comments = adjacent_leading;

            // trailing same-line comment right after the terminating `;`
            if self.peek().kind == TokKind::Semicolon {
                let semi_line = self.peek().line;
                self.advance();
                if self.peek().is_comment() && self.peek().line == semi_line {
                    let c = self.advance();
                    stmt.trailing_comments.push(c.comment_text().unwrap_or_default().to_string());
                }
                prev_stmt_end_line = Some(semi_line);
            } else if self.at_eof() {
                prev_stmt_end_line = Some(self.peek().line);
            } else {
                return Err(self.unexpected(";"));
            }

            statements.push(stmt);
        }

        Ok(Sql::new(statements))
    }

    fn collect_comments(&mut self) -> Vec<Comment> {
        let mut out = Vec::new();
        while self.peek().is_comment() {
            let t = self.advance();
            out.push(Comment {
                text:       t.comment_text().unwrap_or_default().to_string(),
                start_line: t.line,
                end_line:   t.end_line
            });
        }
        out
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_n(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn unexpected(&self, expected: impl Into<String>) -> HousekeeperError {
        let t = self.peek();
        parse_error(t.line, t.column, expected, t.describe())
    }

    /// Case-insensitive keyword match against an `Ident` token, without consuming.
    fn is_keyword(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokKind::Ident(s) if s.eq_ignore_ascii_case(word))
    }

    fn is_keyword_n(&self, n: usize, word: &str) -> bool {
        matches!(&self.peek_n(n).kind, TokKind::Ident(s) if s.eq_ignore_ascii_case(word))
    }

    /// Consume the keyword if present, returning whether it matched.
    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.is_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    /// Consume a multi-word keyword phrase (e.g. `NOT NULL`, `ON CLUSTER`).
    fn eat_keywords(&mut self, words: &[&str]) -> bool {
        for (i, w) in words.iter().enumerate() {
            if !self.is_keyword_n(i, w) {
                return false;
            }
        }
        for _ in words {
            self.advance();
        }
        true
    }

    fn expect_punct(&mut self, kind: TokKind) -> Result<()> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(format!("{kind:?}")))
        }
    }

    fn eat_punct(&mut self, kind: TokKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<crate::ast::Ident> {
        match &self.peek().kind {
            TokKind::Ident(s) => {
                let ident = crate::ast::Ident::new(s.clone());
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected("an identifier"))
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("a string literal"))
        }
    }

    fn expect_number(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokKind::Number(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("a number"))
        }
    }

    /// Parse a dotted `db.name` or bare `name` qualified name.
    fn parse_qualified_name(&mut self) -> Result<crate::ast::QualifiedName> {
        let first = self.expect_ident()?;
        if self.eat_punct(TokKind::Dot) {
            let second = self.expect_ident()?;
            Ok(crate::ast::QualifiedName::new(Some(first), second))
        } else {
            Ok(crate::ast::QualifiedName::bare(first))
        }
    }

    fn parse_on_cluster(&mut self) -> Result<Option<crate::ast::Ident>> {
        if self.eat_keywords(&["ON", "CLUSTER"]) {
            Ok(Some(self.expect_ident()?))
        } else {
            Ok(None)
        }
    }

    fn parse_if_not_exists(&mut self) -> bool {
        self.eat_keywords(&["IF", "NOT", "EXISTS"])
    }

    fn parse_if_exists(&mut self) -> bool {
        self.eat_keywords(&["IF", "EXISTS"])
    }

    /// Parse a parenthesised, comma-separated list using `item`.
    fn parse_paren_list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        self.expect_punct(TokKind::LParen)?;
        let mut items = Vec::new();
        if self.peek().kind != TokKind::RParen {
            loop {
                items.push(item(self)?);
                if !self.eat_punct(TokKind::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(TokKind::RParen)?;
        Ok(items)
    }
}

fn join_comments(comments: &[Comment]) -> String {
    comments.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n")
}

/// Split out the comment (if any) that sits on the same line as the
/// previous statement's terminator — it belongs to that statement as a
/// trailing comment, not to whatever comes next.
fn split_trailing(comments: &[Comment], prev_end_line: Option<usize>) -> (Vec<Comment>, Vec<Comment>) {
    match (comments.first(), prev_end_line) {
        (Some(first), Some(end_line)) if first.start_line == end_line => {
            (vec![Comment { text: first.text.clone(), start_line: first.start_line, end_line: first.end_line }],
             comments[1..]
                 .iter()
                 .map(|c| Comment { text: c.text.clone(), start_line: c.start_line, end_line: c.end_line })
                 .collect())
        }
        _ => (
            Vec::new(),
            comments
                .iter()
                .map(|c| Comment { text: c.text.clone(), start_line: c.start_line, end_line: c.end_line })
                .collect()
        )
    }
}

/// Of the remaining comments, split into orphan comments (separated by a
/// blank line from the next statement and from each other) and the
/// contiguous run immediately preceding the next statement, which attaches
/// as its leading comments.
fn split_adjacent(comments: &[Comment], next_stmt_line: usize) -> (Vec<String>, Vec<String>) {
    if comments.is_empty() {
        return (Vec::new(), Vec::new());
    }
    // walk backwards from the statement, growing the adjacent run while
    // each comment directly precedes (no blank line) the next item.
    let mut boundary = comments.len();
    let mut expected_next_line = next_stmt_line;
    for i in (0..comments.len()).rev() {
        if comments[i].end_line + 1 >= expected_next_line {
            boundary = i;
            expected_next_line = comments[i].start_line;
        } else {
            break;
        }
    }
    let orphans = comments[..boundary].iter().map(|c| c.text.clone()).collect();
    let leading = comments[boundary..].iter().map(|c| c.text.clone()).collect();
    (orphans, leading)
}
