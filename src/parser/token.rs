//! Token kinds produced by the lexer.

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    /// A bare or backtick-quoted identifier, case preserved, unquoted.
    Ident(String),
    /// An integer/decimal/hex/exponent literal, kept as its original text.
    Number(String),
    /// A single-quoted string literal, already unescaped.
    Str(String),
    Comma,
    Dot,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semicolon,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pipe,
    Arrow,
    LineComment(String),
    BlockComment(String),
    Eof
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:      TokKind,
    pub line:      usize,
    pub column:    usize,
    /// Line the token's LAST character sits on (differs from `line` only
    /// for multi-line block comments).
    pub end_line:  usize
}

impl Token {
    /// A human-readable description used in parse error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokKind::Ident(s) => s.clone(),
            TokKind::Number(s) => s.clone(),
            TokKind::Str(s) => format!("'{s}'"),
            TokKind::Comma => ",".into(),
            TokKind::Dot => ".".into(),
            TokKind::Colon => ":".into(),
            TokKind::LParen => "(".into(),
            TokKind::RParen => ")".into(),
            TokKind::LBracket => "[".into(),
            TokKind::RBracket => "]".into(),
            TokKind::LBrace => "{".into(),
            TokKind::RBrace => "}".into(),
            TokKind::Semicolon => ";".into(),
            TokKind::Eq => "=".into(),
            TokKind::NotEq => "!=".into(),
            TokKind::Lt => "<".into(),
            TokKind::LtEq => "<=".into(),
            TokKind::Gt => ">".into(),
            TokKind::GtEq => ">=".into(),
            TokKind::Plus => "+".into(),
            TokKind::Minus => "-".into(),
            TokKind::Star => "*".into(),
            TokKind::Slash => "/".into(),
            TokKind::Percent => "%".into(),
            TokKind::Pipe => "|".into(),
            TokKind::Arrow => "->".into(),
            TokKind::LineComment(_) => "line comment".into(),
            TokKind::BlockComment(_) => "block comment".into(),
            TokKind::Eof => "end of input".into()
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokKind::LineComment(_) | TokKind::BlockComment(_))
    }

    /// The raw comment text (marker stripped, trimmed).
    pub fn comment_text(&self) -> Option<&str> {
        match &self.kind {
            TokKind::LineComment(s) | TokKind::BlockComment(s) => Some(s),
            _ => None
        }
    }
}
