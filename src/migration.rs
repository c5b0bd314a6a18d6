//! Migration directory loading, integrity validation, and snapshotting
//! (spec §4.4).
//!
//! A migration set is a flat directory of `<version>[_description].sql`
//! files plus one `housekeeper.sum` manifest. Loading parses every file
//! up front so a syntax error surfaces before the executor ever opens a
//! connection.

use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::{debug, info, warn};

use crate::{
    ast::Sql,
    error::{HousekeeperError, Result},
    sumfile::{SumFile, hash_bytes}
};

const SUM_FILE_NAME: &str = "housekeeper.sum";

/// One immutable `<version>.sql` file, already parsed and hashed.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version:             String,
    pub filename:            String,
    pub raw:                 String,
    pub parsed:              Sql,
    pub hash:                String,
    pub is_snapshot:         bool,
    pub included_migrations: Vec<String>
}

impl Migration {
    /// Statements that advance the schema, excluding bare comment
    /// statements — these are what the executor counts and resumes by.
    pub fn statement_count(&self) -> usize {
        self.parsed
            .statements
            .iter()
            .filter(|s| !matches!(s.kind, crate::ast::StatementKind::CommentStatement(_)))
            .count()
    }
}

/// A loaded, sorted migration set plus whatever sum file was on disk.
#[derive(Debug, Clone)]
pub struct MigrationDir {
    pub path:       PathBuf,
    pub migrations: Vec<Migration>,
    pub sum_file:   Option<SumFile>
}

/// The leading run of digits before `.sql` or the first `_`, e.g.
/// `20240101120000` out of `20240101120000_create_users.sql`.
fn version_of(filename: &str) -> Option<String> {
    let stem = filename.strip_suffix(".sql")?;
    let version: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    if version.is_empty() { None } else { Some(version) }
}

fn is_migration_filename(filename: &str) -> bool {
    filename != SUM_FILE_NAME && filename.ends_with(".sql") && version_of(filename).is_some()
}

impl MigrationDir {
    /// Enumerate `<version>.sql` files, parse and hash each, load
    /// `housekeeper.sum` if present, and sort lexicographically by
    /// version.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        let mut migrations = Vec::new();

        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !is_migration_filename(&filename) {
                continue;
            }
            let raw_bytes = fs::read(entry.path())?;
            let raw = String::from_utf8_lossy(&raw_bytes).into_owned();
            let parsed = crate::cache::parse_cached(&raw)?;
            let version = version_of(&filename).expect("checked by is_migration_filename");
            let is_snapshot = filename.contains("_snapshot");
            debug!(filename = %filename, version = %version, "loaded migration");
            migrations.push(Migration {
                version,
                filename,
                hash: hash_bytes(&raw_bytes),
                raw,
                parsed,
                is_snapshot,
                included_migrations: Vec::new()
            });
        }

        migrations.sort_by(|a, b| a.version.cmp(&b.version));

        let sum_path = path.join(SUM_FILE_NAME);
        let sum_file = match fs::read_to_string(&sum_path) {
            Ok(text) => Some(SumFile::parse(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into())
        };

        info!(count = migrations.len(), path = %path.display(), "loaded migration directory");
        Ok(Self { path, migrations, sum_file })
    }

    fn regenerate_sum(&self) -> SumFile {
        let files: Vec<(String, Vec<u8>)> =
            self.migrations.iter().map(|m| (m.filename.clone(), m.raw.clone().into_bytes())).collect();
        SumFile::build(&files)
    }

    /// True iff the stored sum file's `totalHash` matches one
    /// regenerated from the currently loaded files. A missing sum file
    /// is invalid.
    pub fn validate(&self) -> bool {
        match &self.sum_file {
            Some(stored) => {
                let regenerated = self.regenerate_sum();
                let valid = regenerated.total_hash == stored.total_hash;
                if !valid {
                    warn!(path = %self.path.display(), "migration directory failed integrity validation");
                }
                valid
            }
            None => false
        }
    }

    /// Recompute the in-memory sum file from the current files. The
    /// caller is responsible for persisting it with
    /// [`MigrationDir::write_sum_file`].
    pub fn rehash(&mut self) {
        self.sum_file = Some(self.regenerate_sum());
    }

    /// Write the in-memory sum file to `housekeeper.sum`, via a
    /// write-to-temp-then-rename so a crash mid-write never leaves a
    /// half-written manifest.
    pub fn write_sum_file(&self) -> Result<()> {
        let Some(sum) = &self.sum_file else {
            return Err(HousekeeperError::Integrity("no sum file to write; call rehash() first".into()));
        };
        let final_path = self.path.join(SUM_FILE_NAME);
        let tmp_path = self.path.join(format!("{SUM_FILE_NAME}.tmp"));
        fs::write(&tmp_path, sum.render())?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Concatenate the raw text of every migration up to and including
    /// `through_version` into one new `<through_version>_snapshot.sql`,
    /// delete the consumed files, and rehash.
    pub fn create_snapshot(&mut self, through_version: &str) -> Result<()> {
        let cut = self
            .migrations
            .iter()
            .position(|m| m.version == through_version)
            .ok_or_else(|| HousekeeperError::Integrity(format!("no migration with version {through_version}")))?;

        let included: Vec<Migration> = self.migrations.drain(..=cut).collect();
        let included_versions: Vec<String> = included.iter().map(|m| m.version.clone()).collect();

        let mut snapshot_text = String::new();
        for m in &included {
            snapshot_text.push_str(&m.raw);
            if !snapshot_text.ends_with('\n') {
                snapshot_text.push('\n');
            }
        }
        let cumulative_hash = hash_bytes(
            included.iter().map(|m| m.hash.as_str()).collect::<Vec<_>>().join("\n").as_bytes()
        );

        let filename = format!("{through_version}_snapshot.sql");
        fs::write(self.path.join(&filename), &snapshot_text)?;
        for m in &included {
            if m.filename != filename {
                fs::remove_file(self.path.join(&m.filename))?;
            }
        }

        let parsed = crate::parser::parse(&snapshot_text)?;
        self.migrations.insert(
            0,
            Migration {
                version: through_version.to_string(),
                filename,
                hash: cumulative_hash.clone(),
                raw: snapshot_text,
                parsed,
                is_snapshot: true,
                included_migrations: included_versions
            }
        );
        self.migrations.sort_by(|a, b| a.version.cmp(&b.version));

        self.rehash();
        self.write_sum_file()?;
        info!(through_version, cumulative_hash, "created migration snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_from_filename() {
        assert_eq!(version_of("20240101120000_create_users.sql").as_deref(), Some("20240101120000"));
        assert_eq!(version_of("20240101120000.sql").as_deref(), Some("20240101120000"));
        assert_eq!(version_of("not_a_migration.txt"), None);
    }

    #[test]
    fn load_parses_and_sorts_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240102000000_b.sql"), "CREATE DATABASE b ENGINE=Atomic;\n").unwrap();
        fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Atomic;\n").unwrap();

        let mut loaded = MigrationDir::load(dir.path()).unwrap();
        assert_eq!(loaded.migrations[0].version, "20240101000000");
        assert_eq!(loaded.migrations[1].version, "20240102000000");
        assert!(!loaded.validate());

        loaded.rehash();
        loaded.write_sum_file().unwrap();
        let reloaded = MigrationDir::load(dir.path()).unwrap();
        assert!(reloaded.validate());
    }

    #[test]
    fn tampering_with_a_file_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Atomic;\n").unwrap();
        let mut loaded = MigrationDir::load(dir.path()).unwrap();
        loaded.rehash();
        loaded.write_sum_file().unwrap();

        fs::write(dir.path().join("20240101000000_a.sql"), "CREATE DATABASE a ENGINE=Memory;\n").unwrap();
        let reloaded = MigrationDir::load(dir.path()).unwrap();
        assert!(!reloaded.validate());
    }
}
