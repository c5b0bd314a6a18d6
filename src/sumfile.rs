//! `housekeeper.sum` — a content-addressed manifest providing tamper
//! detection for a migration directory (spec §4.4).
//!
//! Format is deliberately textual and sorted rather than binary:
//! diffability and auditability matter more than parse speed.
//!
//! ```text
//! h1:9f3c5e...
//! 20240101120000_create_users.sql h1:1a2b...
//! 20240101130000_create_events.sql h1:8c9d...
//! ```

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::error::{HousekeeperError, Result};

const ALGO_PREFIX: &str = "h1:";

/// One file's recorded hash, plus the aggregate `totalHash` over all of
/// them in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumFile {
    pub total_hash: String,
    pub entries:    Vec<SumEntry>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumEntry {
    pub filename: String,
    pub hash:     String
}

/// SHA-256 of raw bytes, formatted as `h1:<hex>`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{ALGO_PREFIX}{}", hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

impl SumFile {
    /// Build a `SumFile` from `(filename, raw bytes)` pairs. Entries are
    /// sorted by filename; the total hash is the hash of the
    /// newline-joined per-file hash lines in that sorted order.
    pub fn build(files: &[(String, Vec<u8>)]) -> Self {
        let mut entries: Vec<SumEntry> =
            files.iter().map(|(name, bytes)| SumEntry { filename: name.clone(), hash: hash_bytes(bytes) }).collect();
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));

        let mut buf = String::new();
        for entry in &entries {
            let _ = writeln!(buf, "{} {}", entry.filename, entry.hash);
        }
        let total_hash = hash_bytes(buf.as_bytes());

        Self { total_hash, entries }
    }

    /// Render in the canonical on-disk format.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.total_hash);
        for entry in &self.entries {
            let _ = writeln!(out, "{} {}", entry.filename, entry.hash);
        }
        out
    }

    /// Parse the canonical format; any deviation is an `Integrity` error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let total_hash = lines
            .next()
            .filter(|l| l.starts_with(ALGO_PREFIX))
            .ok_or_else(|| HousekeeperError::Integrity("sum file missing total hash line".into()))?
            .to_string();

        let mut entries = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (filename, hash) = line
                .rsplit_once(' ')
                .ok_or_else(|| HousekeeperError::Integrity(format!("malformed sum file line: {line:?}")))?;
            if !hash.starts_with(ALGO_PREFIX) {
                return Err(HousekeeperError::Integrity(format!("malformed hash in sum file line: {line:?}")));
            }
            entries.push(SumEntry { filename: filename.to_string(), hash: hash.to_string() });
        }

        Ok(Self { total_hash, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_render_and_parse() {
        let sum = SumFile::build(&[("a.sql".into(), b"CREATE DATABASE a;".to_vec()), ("b.sql".into(), b"CREATE DATABASE b;".to_vec())]);
        let rendered = sum.render();
        let parsed = SumFile::parse(&rendered).unwrap();
        assert_eq!(sum, parsed);
    }

    #[test]
    fn entries_are_sorted_by_filename() {
        let sum = SumFile::build(&[("z.sql".into(), b"1".to_vec()), ("a.sql".into(), b"2".to_vec())]);
        assert_eq!(sum.entries[0].filename, "a.sql");
        assert_eq!(sum.entries[1].filename, "z.sql");
    }

    #[test]
    fn tampering_with_a_byte_changes_the_total_hash() {
        let original = SumFile::build(&[("a.sql".into(), b"CREATE DATABASE a;".to_vec())]);
        let tampered = SumFile::build(&[("a.sql".into(), b"CREATE DATABASE A;".to_vec())]);
        assert_ne!(original.total_hash, tampered.total_hash);
    }

    #[test]
    fn rejects_a_missing_total_hash_line() {
        assert!(SumFile::parse("not-a-hash\n").is_err());
    }
}
