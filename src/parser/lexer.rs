//! Hand-written lexer for ClickHouse DDL.
//!
//! Produces a flat token stream that still contains comment tokens (they
//! are trivia, not noise — the parser attaches them to statements). Every
//! token carries its starting line/column so parse errors are
//! position-qualified.

use super::token::{TokKind, Token};
use crate::error::{HousekeeperError, Result, parse_error};

pub struct Lexer<'a> {
    chars:   Vec<char>,
    pos:     usize,
    line:    usize,
    column:  usize,
    _marker: std::marker::PhantomData<&'a str>
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            _marker: std::marker::PhantomData
        }
    }

    pub fn tokenize(src: &'a str) -> Result<Vec<Token>> {
        let mut lexer = Self::new(src);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn err(&self, expected: &str, found: impl Into<String>) -> HousekeeperError {
        parse_error(self.line, self.column, expected, found)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let (line, column) = (self.line, self.column);

        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokKind::Eof, line, column, end_line: line });
        };

        if c == '-' && self.peek_at(1) == Some('-') {
            return self.read_line_comment(line, column);
        }
        if c == '/' && self.peek_at(1) == Some('*') {
            return self.read_block_comment(line, column);
        }
        if c == '`' {
            return self.read_backtick_ident(line, column);
        }
        if c == '\'' {
            return self.read_string(line, column);
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.read_number(line, column);
        }
        if is_ident_start(c) {
            return self.read_ident(line, column);
        }

        self.bump();
        let kind = match c {
            ',' => TokKind::Comma,
            '.' => TokKind::Dot,
            ':' => TokKind::Colon,
            '(' => TokKind::LParen,
            ')' => TokKind::RParen,
            '[' => TokKind::LBracket,
            ']' => TokKind::RBracket,
            '{' => TokKind::LBrace,
            '}' => TokKind::RBrace,
            ';' => TokKind::Semicolon,
            '+' => TokKind::Plus,
            '*' => TokKind::Star,
            '/' => TokKind::Slash,
            '%' => TokKind::Percent,
            '=' => TokKind::Eq,
            '|' => TokKind::Pipe,
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::NotEq
                } else {
                    return Err(self.err("!=", "!"));
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::LtEq
                } else if self.peek() == Some('>') {
                    self.bump();
                    TokKind::NotEq
                } else {
                    TokKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::GtEq
                } else {
                    TokKind::Gt
                }
            }
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    TokKind::Arrow
                } else {
                    TokKind::Minus
                }
            }
            other => return Err(self.err("a valid token", other.to_string()))
        };
        Ok(Token { kind, line, column, end_line: self.line })
    }

    fn read_line_comment(&mut self, line: usize, column: usize) -> Result<Token> {
        self.bump();
        self.bump();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(Token {
            kind:     TokKind::LineComment(text.trim().to_string()),
            line,
            column,
            end_line: line
        })
    }

    fn read_block_comment(&mut self, line: usize, column: usize) -> Result<Token> {
        self.bump();
        self.bump();
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.err("*/", "end of input")),
                Some('*') if self.peek_at(1) == Some('/') => break,
                _ => {
                    self.bump();
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let end_line = self.line;
        self.bump();
        self.bump();
        Ok(Token { kind: TokKind::BlockComment(text.trim().to_string()), line, column, end_line })
    }

    fn read_backtick_ident(&mut self, line: usize, column: usize) -> Result<Token> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err("closing `", "end of input")),
                Some('\\') => {
                    self.bump();
                    if let Some(c) = self.bump() {
                        out.push(unescape_char(c));
                    }
                }
                Some('`') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token { kind: TokKind::Ident(out), line, column, end_line: self.line })
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<Token> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err("closing '", "end of input")),
                Some('\\') => {
                    self.bump();
                    if let Some(c) = self.bump() {
                        out.push(unescape_char(c));
                    }
                }
                Some('\'') if self.peek_at(1) == Some('\'') => {
                    // doubled single-quote escape, also valid in ClickHouse
                    out.push('\'');
                    self.bump();
                    self.bump();
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token { kind: TokKind::Str(out), line, column, end_line: self.line })
    }

    fn read_number(&mut self, line: usize, column: usize) -> Result<Token> {
        let start = self.pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            return Ok(Token { kind: TokKind::Number(text), line, column, end_line: line });
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.pos = save;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(Token { kind: TokKind::Number(text), line, column, end_line: line })
    }

    fn read_ident(&mut self, line: usize, column: usize) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(Token { kind: TokKind::Ident(text), line, column, end_line: line })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn unescape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        Lexer::tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_basic_create_table() {
        let toks = kinds("CREATE TABLE t (id UInt64);");
        assert_eq!(
            toks,
            vec![
                TokKind::Ident("CREATE".into()),
                TokKind::Ident("TABLE".into()),
                TokKind::Ident("t".into()),
                TokKind::LParen,
                TokKind::Ident("id".into()),
                TokKind::Ident("UInt64".into()),
                TokKind::RParen,
                TokKind::Semicolon,
                TokKind::Eof
            ]
        );
    }

    #[test]
    fn backtick_identifier_preserves_case_and_specials() {
        let toks = kinds("`My-Table`");
        assert_eq!(toks[0], TokKind::Ident("My-Table".into()));
    }

    #[test]
    fn string_literal_handles_escapes() {
        let toks = kinds(r"'a\'b\\c'");
        assert_eq!(toks[0], TokKind::Str("a'b\\c".into()));
    }

    #[test]
    fn hex_and_exponent_numbers() {
        assert_eq!(kinds("0x1F")[0], TokKind::Number("0x1F".into()));
        assert_eq!(kinds("1.5e-10")[0], TokKind::Number("1.5e-10".into()));
    }

    #[test]
    fn line_and_block_comments_are_kept_as_trivia() {
        let toks = kinds("-- hello\n/* world */");
        assert_eq!(toks[0], TokKind::LineComment("hello".into()));
        assert_eq!(toks[1], TokKind::BlockComment("world".into()));
    }
}
