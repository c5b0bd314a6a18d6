//! Error types for the housekeeper migration engine.
//!
//! This module defines the closed error taxonomy required by the engine:
//! every fallible operation in [`crate::parser`], [`crate::differ`],
//! [`crate::migration`], [`crate::revision`], and [`crate::executor`]
//! returns a [`HousekeeperError`] through the [`Result`] alias.
//!
//! # Error Categories
//!
//! - **Parse errors**: position-qualified SQL parse failures
//! - **Diff errors**: internal diff inconsistency, unsupported operations, no-op sentinel
//! - **Integrity errors**: sum file mismatch or unreadable sum file
//! - **Execution errors**: ClickHouse rejected a statement mid-migration
//! - **Transport/bootstrap errors**: connectivity or tracking-table setup failures

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HousekeeperError>;

/// The complete error taxonomy exposed by the engine.
///
/// Variants map 1:1 onto spec §7. `NoDiff` and `Unsupported` are
/// distinguished sentinels callers can match on without inspecting text.
#[derive(Debug, thiserror::Error)]
pub enum HousekeeperError {
    /// Position-qualified SQL parse failure. Never retried.
    #[error("parse error at {line}:{column}: expected {expected}, found {found}")]
    Parse {
        line:     usize,
        column:   usize,
        expected: String,
        found:    String
    },

    /// Internal inconsistency detected while computing a schema diff.
    #[error("diff error: {0}")]
    Diff(String),

    /// An operation that cannot be expressed as safe DDL was detected
    /// (engine change, cluster change, PARTITION BY change, ...).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Distinguished sentinel: current and target schemas are identical.
    #[error("no difference between current and target schema")]
    NoDiff,

    /// Sum file mismatch, missing sum file, or malformed sum file.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// ClickHouse rejected a statement while applying a migration.
    #[error(
        "execution error in migration {version} at statement {statement_index}: {cause} ({sql:?})"
    )]
    Execution {
        version:         String,
        statement_index: usize,
        sql:             String,
        cause:           String
    },

    /// Bootstrapping the `housekeeper.revisions` tracking table failed.
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// Network/connectivity failure. Safe to retry the whole operation;
    /// progress already recorded in `housekeeper.revisions` is durable.
    #[error("transport error: {0}")]
    Transport(String),

    /// A cancellation signal was observed; the run stopped after the
    /// in-flight statement completed.
    #[error("execution cancelled after migration {version:?}")]
    Cancelled { version: Option<String> },

    /// Wraps an I/O failure (reading migration files, writing sum files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl HousekeeperError {
    /// True for the [`HousekeeperError::NoDiff`] sentinel.
    pub fn is_no_diff(&self) -> bool {
        matches!(self, Self::NoDiff)
    }

    /// True for the [`HousekeeperError::Unsupported`] sentinel.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Position-qualified parse error constructor.
pub fn parse_error(
    line: usize,
    column: usize,
    expected: impl Into<String>,
    found: impl Into<String>
) -> HousekeeperError {
    HousekeeperError::Parse {
        line,
        column,
        expected: expected.into(),
        found: found.into()
    }
}

/// Construct a [`HousekeeperError::Diff`] from a displayable message.
pub fn diff_error(message: impl fmt::Display) -> HousekeeperError {
    HousekeeperError::Diff(message.to_string())
}

/// Construct a [`HousekeeperError::Unsupported`] from a displayable message.
pub fn unsupported_error(message: impl fmt::Display) -> HousekeeperError {
    HousekeeperError::Unsupported(message.to_string())
}

/// Construct a [`HousekeeperError::Integrity`] from a displayable message.
pub fn integrity_error(message: impl fmt::Display) -> HousekeeperError {
    HousekeeperError::Integrity(message.to_string())
}

/// Construct a [`HousekeeperError::Bootstrap`] from a displayable message.
pub fn bootstrap_error(message: impl fmt::Display) -> HousekeeperError {
    HousekeeperError::Bootstrap(message.to_string())
}

/// Construct a [`HousekeeperError::Transport`] from a displayable message.
pub fn transport_error(message: impl fmt::Display) -> HousekeeperError {
    HousekeeperError::Transport(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_diff_is_distinguishable() {
        let err = HousekeeperError::NoDiff;
        assert!(err.is_no_diff());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn unsupported_is_distinguishable() {
        let err = unsupported_error("engine change");
        assert!(err.is_unsupported());
        assert!(!err.is_no_diff());
    }

    #[test]
    fn parse_error_renders_position() {
        let err = parse_error(3, 12, "IDENTIFIER", "EOF");
        assert_eq!(
            err.to_string(),
            "parse error at 3:12: expected IDENTIFIER, found EOF"
        );
    }
}
