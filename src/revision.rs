//! Revision tracking (spec §4.5): durable per-migration execution
//! records persisted inside the managed ClickHouse instance, in
//! `housekeeper.revisions`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{
    client::ClickHouseClient,
    error::Result
};

/// One durable execution record, keyed by migration version.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub version:             String,
    pub executed_at:         DateTime<Utc>,
    pub execution_time_ms:   u64,
    pub total_statements:    u32,
    pub applied_statements:  u32,
    pub error:               Option<String>,
    pub housekeeper_version: String,
    pub is_snapshot:         bool
}

/// How a migration's last-known row classifies it for planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionStatus {
    /// No row exists yet.
    Pending,
    /// `applied = total ∧ error = NULL`.
    Completed,
    /// `0 < applied < total`.
    PartiallyApplied,
    /// `error ≠ NULL ∧ applied < total`.
    Failed
}

impl Revision {
    pub fn status(&self) -> RevisionStatus {
        if self.error.is_some() && self.applied_statements < self.total_statements {
            RevisionStatus::Failed
        } else if self.applied_statements == self.total_statements {
            RevisionStatus::Completed
        } else if self.applied_statements > 0 {
            RevisionStatus::PartiallyApplied
        } else {
            RevisionStatus::Pending
        }
    }
}

/// All loaded revision rows, indexed by version for `O(1)` classification.
#[derive(Debug, Clone, Default)]
pub struct RevisionSet {
    by_version: std::collections::HashMap<String, Revision>
}

impl RevisionSet {
    pub fn new(revisions: Vec<Revision>) -> Self {
        Self { by_version: revisions.into_iter().map(|r| (r.version.clone(), r)).collect() }
    }

    /// [`RevisionStatus::Pending`] for any version with no row.
    pub fn status_of(&self, version: &str) -> RevisionStatus {
        self.by_version.get(version).map(|r| r.status()).unwrap_or(RevisionStatus::Pending)
    }

    pub fn get(&self, version: &str) -> Option<&Revision> {
        self.by_version.get(version)
    }

    pub fn pending<'a>(&'a self, versions: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        versions.filter(|v| self.status_of(v) == RevisionStatus::Pending).collect()
    }

    pub fn failed(&self) -> Vec<&Revision> {
        self.by_version.values().filter(|r| r.status() == RevisionStatus::Failed).collect()
    }

    pub fn completed(&self) -> Vec<&Revision> {
        self.by_version.values().filter(|r| r.status() == RevisionStatus::Completed).collect()
    }
}

/// Persistence for revision rows. The executor is responsible for
/// bootstrapping `housekeeper.revisions` before any of these run.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    async fn load_revisions(&self, ctx: &CancellationToken) -> Result<RevisionSet>;

    /// Insert a fresh row with `applied_statements = 0` and no error.
    async fn record_start(&self, ctx: &CancellationToken, version: &str, total_statements: u32, housekeeper_version: &str) -> Result<()>;

    async fn record_progress(&self, ctx: &CancellationToken, version: &str, applied: u32) -> Result<()>;

    async fn record_success(&self, ctx: &CancellationToken, version: &str, execution_time_ms: u64) -> Result<()>;

    async fn record_failure(&self, ctx: &CancellationToken, version: &str, applied: u32, error_message: &str) -> Result<()>;
}

/// A [`RevisionStore`] backed by the `housekeeper.revisions` table
/// reached through a [`ClickHouseClient`].
///
/// `ReplacingMergeTree` means every `record_*` call is an `INSERT` of a
/// new version of the row; `loadRevisions` relies on `FINAL` to collapse
/// to the latest write per version.
pub struct ClickHouseRevisionStore<'a> {
    client: &'a dyn ClickHouseClient
}

impl<'a> ClickHouseRevisionStore<'a> {
    pub fn new(client: &'a dyn ClickHouseClient) -> Self {
        Self { client }
    }

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('\'', "\\'")
    }
}

#[async_trait]
impl<'a> RevisionStore for ClickHouseRevisionStore<'a> {
    async fn load_revisions(&self, ctx: &CancellationToken) -> Result<RevisionSet> {
        let rows = self
            .client
            .query(
                ctx,
                "SELECT version, executed_at, execution_time_ms, total_statements, applied_statements, error, \
                 housekeeper_version, is_snapshot FROM housekeeper.revisions FINAL"
            )
            .await?;

        let mut revisions = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() < 8 {
                continue;
            }
            revisions.push(Revision {
                version:             row[0].clone(),
                executed_at:         DateTime::parse_from_rfc3339(&row[1])
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
                execution_time_ms:   row[2].parse().unwrap_or(0),
                total_statements:    row[3].parse().unwrap_or(0),
                applied_statements:  row[4].parse().unwrap_or(0),
                error:               if row[5].is_empty() || row[5] == "\\N" { None } else { Some(row[5].clone()) },
                housekeeper_version: row[6].clone(),
                is_snapshot:         row[7] == "1"
            });
        }
        Ok(RevisionSet::new(revisions))
    }

    async fn record_start(&self, ctx: &CancellationToken, version: &str, total_statements: u32, housekeeper_version: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO housekeeper.revisions (version, executed_at, execution_time_ms, total_statements, \
             applied_statements, error, housekeeper_version, is_snapshot) VALUES ('{}', now64(3), 0, {}, 0, NULL, '{}', 0)",
            Self::escape(version),
            total_statements,
            Self::escape(housekeeper_version)
        );
        self.client.execute(ctx, &sql).await
    }

    async fn record_progress(&self, ctx: &CancellationToken, version: &str, applied: u32) -> Result<()> {
        let sql = format!(
            "INSERT INTO housekeeper.revisions (version, executed_at, execution_time_ms, total_statements, \
             applied_statements, error, housekeeper_version, is_snapshot) \
             SELECT version, now64(3), execution_time_ms, total_statements, {applied}, error, housekeeper_version, is_snapshot \
             FROM housekeeper.revisions FINAL WHERE version = '{}'",
            Self::escape(version)
        );
        self.client.execute(ctx, &sql).await
    }

    async fn record_success(&self, ctx: &CancellationToken, version: &str, execution_time_ms: u64) -> Result<()> {
        let sql = format!(
            "INSERT INTO housekeeper.revisions (version, executed_at, execution_time_ms, total_statements, \
             applied_statements, error, housekeeper_version, is_snapshot) \
             SELECT version, now64(3), {execution_time_ms}, total_statements, total_statements, NULL, housekeeper_version, is_snapshot \
             FROM housekeeper.revisions FINAL WHERE version = '{}'",
            Self::escape(version)
        );
        self.client.execute(ctx, &sql).await
    }

    async fn record_failure(&self, ctx: &CancellationToken, version: &str, applied: u32, error_message: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO housekeeper.revisions (version, executed_at, execution_time_ms, total_statements, \
             applied_statements, error, housekeeper_version, is_snapshot) \
             SELECT version, now64(3), execution_time_ms, total_statements, {applied}, '{}', housekeeper_version, is_snapshot \
             FROM housekeeper.revisions FINAL WHERE version = '{}'",
            Self::escape(error_message),
            Self::escape(version)
        );
        self.client.execute(ctx, &sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(applied: u32, total: u32, error: Option<&str>) -> Revision {
        Revision {
            version: "v1".into(),
            executed_at: Utc::now(),
            execution_time_ms: 0,
            total_statements: total,
            applied_statements: applied,
            error: error.map(str::to_string),
            housekeeper_version: "test".into(),
            is_snapshot: false
        }
    }

    #[test]
    fn classifies_pending_when_no_row() {
        let set = RevisionSet::default();
        assert_eq!(set.status_of("missing"), RevisionStatus::Pending);
    }

    #[test]
    fn classifies_completed() {
        assert_eq!(revision(3, 3, None).status(), RevisionStatus::Completed);
    }

    #[test]
    fn classifies_partially_applied() {
        assert_eq!(revision(1, 3, None).status(), RevisionStatus::PartiallyApplied);
    }

    #[test]
    fn classifies_failed() {
        assert_eq!(revision(1, 3, Some("boom")).status(), RevisionStatus::Failed);
    }
}
