//! Applies a loaded migration set against a live ClickHouse instance,
//! resuming from whatever `housekeeper.revisions` last recorded (spec
//! §4.6).

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    ast::{Ident, StatementKind},
    client::ClickHouseClient,
    error::{HousekeeperError, Result},
    formatter::format_statement,
    migration::{Migration, MigrationDir},
    revision::{RevisionSet, RevisionStatus, RevisionStore}
};

/// Outcome of applying (or skipping) one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    Success,
    Failed,
    Skipped
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub version:            String,
    pub status:             MigrationStatus,
    pub applied_statements: u32,
    pub total_statements:   u32,
    pub execution_time_ms:  u64,
    pub error:              Option<String>
}

/// Executor configuration: the pieces that don't change between runs.
pub struct Executor<'a> {
    client:              &'a dyn ClickHouseClient,
    revisions:           &'a dyn RevisionStore,
    housekeeper_version: String,
    cluster:             Option<Ident>,
    dry_run:             bool
}

impl<'a> Executor<'a> {
    pub fn new(client: &'a dyn ClickHouseClient, revisions: &'a dyn RevisionStore, housekeeper_version: impl Into<String>) -> Self {
        Self { client, revisions, housekeeper_version: housekeeper_version.into(), cluster: None, dry_run: false }
    }

    pub fn with_cluster(mut self, cluster: Ident) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// `CREATE DATABASE IF NOT EXISTS housekeeper` /
    /// `CREATE TABLE IF NOT EXISTS housekeeper.revisions (...)`, both with
    /// `ON CLUSTER` when configured. A no-op if already bootstrapped.
    pub async fn bootstrap(&self, ctx: &CancellationToken) -> Result<()> {
        if self.dry_run {
            info!("dry run: skipping bootstrap");
            return Ok(());
        }
        let on_cluster = self.cluster.as_ref().map(|c| format!(" ON CLUSTER {c}")).unwrap_or_default();

        let create_db = format!("CREATE DATABASE IF NOT EXISTS housekeeper{on_cluster}");
        self.client.execute(ctx, &create_db).await.map_err(|e| HousekeeperError::Bootstrap(e.to_string()))?;

        let engine = if self.cluster.is_some() { "ReplicatedReplacingMergeTree(executed_at)" } else { "ReplacingMergeTree(executed_at)" };
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS housekeeper.revisions{on_cluster} (\n\
             \u{20}\u{20}version String,\n\
             \u{20}\u{20}executed_at DateTime64(3, 'UTC'),\n\
             \u{20}\u{20}execution_time_ms UInt64,\n\
             \u{20}\u{20}total_statements UInt32,\n\
             \u{20}\u{20}applied_statements UInt32,\n\
             \u{20}\u{20}error Nullable(String),\n\
             \u{20}\u{20}housekeeper_version String,\n\
             \u{20}\u{20}is_snapshot UInt8 DEFAULT 0\n\
             ) ENGINE = {engine} ORDER BY version"
        );
        self.client.execute(ctx, &create_table).await.map_err(|e| HousekeeperError::Bootstrap(e.to_string()))?;
        Ok(())
    }

    /// Apply every migration in `dir`, in version order, skipping what's
    /// already complete and resuming what's partial.
    pub async fn run(&self, ctx: &CancellationToken, dir: &MigrationDir) -> Result<Vec<ExecutionResult>> {
        self.bootstrap(ctx).await?;
        let revisions = self.revisions.load_revisions(ctx).await?;

        let mut results = Vec::with_capacity(dir.migrations.len());
        for migration in &dir.migrations {
            if ctx.is_cancelled() {
                return Err(HousekeeperError::Cancelled { version: Some(migration.version.clone()) });
            }

            let status = revisions.status_of(&migration.version);
            let result = match status {
                RevisionStatus::Completed => {
                    info!(version = %migration.version, "skipping completed migration");
                    ExecutionResult {
                        version:            migration.version.clone(),
                        status:             MigrationStatus::Skipped,
                        applied_statements: migration.statement_count() as u32,
                        total_statements:   migration.statement_count() as u32,
                        execution_time_ms:  0,
                        error:              None
                    }
                }
                RevisionStatus::Pending => self.apply_migration(ctx, migration, 0, &revisions).await,
                RevisionStatus::PartiallyApplied | RevisionStatus::Failed => {
                    let resume_at = revisions.get(&migration.version).map(|r| r.applied_statements).unwrap_or(0);
                    self.apply_migration(ctx, migration, resume_at, &revisions).await
                }
            };

            let failed = result.status == MigrationStatus::Failed;
            results.push(result);
            if failed {
                break;
            }
        }
        Ok(results)
    }

    async fn apply_migration(
        &self,
        ctx: &CancellationToken,
        migration: &Migration,
        resume_at: u32,
        revisions: &RevisionSet
    ) -> ExecutionResult {
        let total = migration.statement_count() as u32;

        if self.dry_run {
            info!(version = %migration.version, resume_at, total, "dry run: would execute");
            return ExecutionResult {
                version: migration.version.clone(),
                status: MigrationStatus::Skipped,
                applied_statements: resume_at,
                total_statements: total,
                execution_time_ms: 0,
                error: None
            };
        }

        let started = Instant::now();
        if resume_at == 0 && revisions.get(&migration.version).is_none() {
            if let Err(e) = self.revisions.record_start(ctx, &migration.version, total, &self.housekeeper_version).await {
                return ExecutionResult {
                    version:            migration.version.clone(),
                    status:             MigrationStatus::Failed,
                    applied_statements: 0,
                    total_statements:   total,
                    execution_time_ms:  elapsed_ms(started),
                    error:              Some(e.to_string())
                };
            }
        }

        let mut applied = 0u32;
        for stmt in &migration.parsed.statements {
            if let StatementKind::CommentStatement(_) = &stmt.kind {
                continue;
            }
            if applied < resume_at {
                applied += 1;
                continue;
            }
            if ctx.is_cancelled() {
                return ExecutionResult {
                    version: migration.version.clone(),
                    status: MigrationStatus::Failed,
                    applied_statements: applied,
                    total_statements: total,
                    execution_time_ms: elapsed_ms(started),
                    error: Some(HousekeeperError::Cancelled { version: Some(migration.version.clone()) }.to_string())
                };
            }

            let mut stmt = stmt.clone();
            if let Some(cluster) = &self.cluster {
                if stmt.on_cluster().is_none() {
                    stmt.set_on_cluster(cluster.clone());
                }
            }
            let rendered = format_statement(&stmt);
            let (ddl, settings) = if has_persisted_settings_clause(&stmt.kind) {
                (rendered.trim_end_matches(';').to_string(), Vec::new())
            } else {
                split_trailing_settings(rendered.trim_end_matches(';'))
            };

            if let Err(e) = self.apply_settings(ctx, &settings).await {
                warn!(version = %migration.version, statement = applied, error = %e, "failed to apply connection settings");
            }

            match self.client.execute(ctx, &ddl).await {
                Ok(()) => {
                    applied += 1;
                    if let Err(e) = self.revisions.record_progress(ctx, &migration.version, applied).await {
                        warn!(version = %migration.version, error = %e, "failed to record progress");
                    }
                }
                Err(e) => {
                    let err = match e {
                        HousekeeperError::Execution { sql, cause, .. } => HousekeeperError::Execution {
                            version: migration.version.clone(),
                            statement_index: applied as usize,
                            sql,
                            cause
                        },
                        other => other
                    };
                    let message = err.to_string();
                    let _ = self.revisions.record_failure(ctx, &migration.version, applied, &message).await;
                    return ExecutionResult {
                        version:            migration.version.clone(),
                        status:             MigrationStatus::Failed,
                        applied_statements: applied,
                        total_statements:   total,
                        execution_time_ms:  elapsed_ms(started),
                        error:              Some(message)
                    };
                }
            }
        }

        let elapsed = elapsed_ms(started);
        if let Err(e) = self.revisions.record_success(ctx, &migration.version, elapsed).await {
            warn!(version = %migration.version, error = %e, "failed to record success");
        }
        ExecutionResult {
            version: migration.version.clone(),
            status: MigrationStatus::Success,
            applied_statements: applied,
            total_statements: total,
            execution_time_ms: elapsed,
            error: None
        }
    }

    /// `SETTINGS k = v` clauses are moved to `SET k = v` on the
    /// connection instead of being inlined in the DDL.
    async fn apply_settings(&self, ctx: &CancellationToken, settings: &[(String, String)]) -> Result<()> {
        for (key, value) in settings {
            self.client.execute(ctx, &format!("SET {key} = {value}")).await?;
        }
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// True for statement kinds whose rendered `SETTINGS` clause is part of
/// the object's own persisted definition (MergeTree/dictionary settings)
/// rather than a connection-level execution setting. Splitting these off
/// and issuing them as `SET` statements would silently drop them from the
/// created object.
fn has_persisted_settings_clause(kind: &StatementKind) -> bool {
    matches!(kind, StatementKind::CreateTable(_) | StatementKind::CreateMaterializedView(_) | StatementKind::CreateDictionary(_))
}

/// Split a trailing `SETTINGS k = v, k2 = v2` clause off the end of a
/// rendered statement (before any trailing `COMMENT` clause), returning
/// the statement with the clause removed and the parsed key/value pairs.
/// Only call this for statement kinds where [`has_persisted_settings_clause`]
/// is false — a `CREATE TABLE`/`CREATE DICTIONARY`'s own `SETTINGS` clause
/// must stay inlined.
fn split_trailing_settings(sql: &str) -> (String, Vec<(String, String)>) {
    let Some(idx) = sql.find("\nSETTINGS ") else {
        return (sql.to_string(), Vec::new());
    };
    let (head, rest) = sql.split_at(idx);
    let rest = &rest["\nSETTINGS ".len()..];
    let (clause, tail) = match rest.find("\nCOMMENT ") {
        Some(comment_idx) => (&rest[..comment_idx], &rest[comment_idx..]),
        None => (rest, "")
    };

    let settings = clause
        .split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect();

    (format!("{head}{tail}"), settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_settings_clause_from_statement() {
        let (sql, settings) =
            split_trailing_settings("CREATE TABLE d.t (id UInt64) ENGINE = MergeTree ORDER BY id\nSETTINGS index_granularity = 8192");
        assert_eq!(sql, "CREATE TABLE d.t (id UInt64) ENGINE = MergeTree ORDER BY id");
        assert_eq!(settings, vec![("index_granularity".to_string(), "8192".to_string())]);
    }

    #[test]
    fn create_table_settings_are_never_lifted() {
        let parsed = crate::parser::parse(
            "CREATE TABLE d.t (id UInt64) ENGINE = MergeTree ORDER BY id SETTINGS index_granularity = 8192;"
        )
        .unwrap();
        let stmt = &parsed.statements[0];
        assert!(has_persisted_settings_clause(&stmt.kind));
        let rendered = format_statement(stmt);
        let (ddl, settings) = if has_persisted_settings_clause(&stmt.kind) {
            (rendered.trim_end_matches(';').to_string(), Vec::new())
        } else {
            split_trailing_settings(rendered.trim_end_matches(';'))
        };
        assert!(ddl.contains("SETTINGS index_granularity = 8192"));
        assert!(settings.is_empty());
    }

    #[test]
    fn leaves_statements_without_settings_untouched() {
        let (sql, settings) = split_trailing_settings("CREATE DATABASE d");
        assert_eq!(sql, "CREATE DATABASE d");
        assert!(settings.is_empty());
    }

    #[test]
    fn preserves_a_trailing_comment_clause_after_settings() {
        let (sql, settings) = split_trailing_settings("CREATE TABLE d.t (id UInt64)\nSETTINGS a = 1\nCOMMENT 'hi'");
        assert_eq!(sql, "CREATE TABLE d.t (id UInt64)\nCOMMENT 'hi'");
        assert_eq!(settings, vec![("a".to_string(), "1".to_string())]);
    }
}
