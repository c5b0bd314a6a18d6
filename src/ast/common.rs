//! Identifiers and qualified names shared across every statement kind.

use std::fmt;

/// A bare or backtick-quoted SQL identifier.
///
/// Identifiers are always stored unquoted (spec §3 invariant); whether the
/// formatter backtick-quotes an identifier on output is a rendering
/// decision, not something the parser records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(pub String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A `{database?, name}` pair.
///
/// Never flatten this into a single dotted string (design note §9): the
/// differ reasons about the database component independently of the
/// object name when matching current vs. target objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub database: Option<Ident>,
    pub name:     Ident
}

impl QualifiedName {
    pub fn new(database: Option<Ident>, name: Ident) -> Self {
        Self { database, name }
    }

    pub fn bare(name: impl Into<Ident>) -> Self {
        Self { database: None, name: name.into() }
    }

    pub fn qualified(database: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self { database: Some(database.into()), name: name.into() }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{db}.{name}", name = self.name),
            None => write!(f, "{}", self.name)
        }
    }
}
