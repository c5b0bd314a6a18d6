use std::{
    fs,
    sync::{Arc, Mutex}
};

use async_trait::async_trait;
use housekeeper::{
    ast::Sql,
    client::{ClickHouseClient, Row},
    error::{HousekeeperError, Result},
    executor::{Executor, MigrationStatus},
    migration::MigrationDir,
    revision::{ClickHouseRevisionStore, Revision, RevisionSet, RevisionStatus, RevisionStore}
};
use tokio_util::sync::CancellationToken;

/// An in-memory `ClickHouseClient` that records every statement it was
/// asked to execute and fails on a configured trigger substring.
struct FakeClient {
    executed:    Mutex<Vec<String>>,
    fail_on:     Option<String>,
    fail_budget: Mutex<usize>
}

impl FakeClient {
    fn new() -> Self {
        Self { executed: Mutex::new(Vec::new()), fail_on: None, fail_budget: Mutex::new(0) }
    }

    fn failing_once_on(trigger: impl Into<String>) -> Self {
        Self { executed: Mutex::new(Vec::new()), fail_on: Some(trigger.into()), fail_budget: Mutex::new(1) }
    }

    fn executed_statements(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClickHouseClient for FakeClient {
    async fn query(&self, _ctx: &CancellationToken, _sql: &str) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn execute(&self, _ctx: &CancellationToken, sql: &str) -> Result<()> {
        if let Some(trigger) = &self.fail_on {
            if sql.contains(trigger.as_str()) {
                let mut budget = self.fail_budget.lock().unwrap();
                if *budget > 0 {
                    *budget -= 1;
                    return Err(HousekeeperError::Execution {
                        version:         "test".into(),
                        statement_index: 0,
                        sql:             sql.to_string(),
                        cause:           "simulated failure".into()
                    });
                }
            }
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn get_schema(&self, _ctx: &CancellationToken, _ignore_databases: &[String]) -> Result<Sql> {
        Ok(Sql::new(Vec::new()))
    }

    async fn close(&self) {}
}

/// An in-memory `RevisionStore` backing the resume tests, since the fake
/// ClickHouse client above has no real table to persist rows into.
#[derive(Default)]
struct FakeRevisionStore {
    rows: Mutex<std::collections::HashMap<String, Revision>>
}

#[async_trait]
impl RevisionStore for FakeRevisionStore {
    async fn load_revisions(&self, _ctx: &CancellationToken) -> Result<RevisionSet> {
        Ok(RevisionSet::new(self.rows.lock().unwrap().values().cloned().collect()))
    }

    async fn record_start(&self, _ctx: &CancellationToken, version: &str, total_statements: u32, housekeeper_version: &str) -> Result<()> {
        self.rows.lock().unwrap().insert(
            version.to_string(),
            Revision {
                version: version.to_string(),
                executed_at: chrono::Utc::now(),
                execution_time_ms: 0,
                total_statements,
                applied_statements: 0,
                error: None,
                housekeeper_version: housekeeper_version.to_string(),
                is_snapshot: false
            }
        );
        Ok(())
    }

    async fn record_progress(&self, _ctx: &CancellationToken, version: &str, applied: u32) -> Result<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(version) {
            row.applied_statements = applied;
        }
        Ok(())
    }

    async fn record_success(&self, _ctx: &CancellationToken, version: &str, execution_time_ms: u64) -> Result<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(version) {
            row.applied_statements = row.total_statements;
            row.execution_time_ms = execution_time_ms;
            row.error = None;
        }
        Ok(())
    }

    async fn record_failure(&self, _ctx: &CancellationToken, version: &str, applied: u32, error_message: &str) -> Result<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(version) {
            row.applied_statements = applied;
            row.error = Some(error_message.to_string());
        }
        Ok(())
    }
}

fn write_migration(dir: &tempfile::TempDir, filename: &str, sql: &str) {
    fs::write(dir.path().join(filename), sql).unwrap();
}

#[tokio::test]
async fn s5_resume_continues_from_the_failed_statement() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(
        &dir,
        "20240101000000_three_statements.sql",
        "CREATE DATABASE a ENGINE=Atomic;\nCREATE DATABASE b ENGINE=Atomic;\nCREATE DATABASE c ENGINE=Atomic;\n"
    );
    let mut migrations = MigrationDir::load(dir.path()).unwrap();
    migrations.rehash();
    migrations.write_sum_file().unwrap();

    let client = FakeClient::failing_once_on("CREATE DATABASE b");
    let revisions = FakeRevisionStore::default();
    let executor = Executor::new(&client, &revisions, "test-version");
    let ctx = CancellationToken::new();

    let first_run = executor.run(&ctx, &migrations).await.unwrap();
    assert_eq!(first_run.len(), 1);
    assert_eq!(first_run[0].status, MigrationStatus::Failed);
    assert_eq!(first_run[0].applied_statements, 1);

    let reloaded = MigrationDir::load(dir.path()).unwrap();
    let client = FakeClient::new();
    let executor = Executor::new(&client, &revisions, "test-version");
    let second_run = executor.run(&ctx, &reloaded).await.unwrap();

    assert_eq!(second_run[0].status, MigrationStatus::Success);
    assert_eq!(second_run[0].applied_statements, 3);
    // Only the two remaining statements should have reached ClickHouse.
    assert_eq!(client.executed_statements().len(), 2);
}

#[tokio::test]
async fn invariant_6_second_run_only_skips() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(&dir, "20240101000000_a.sql", "CREATE DATABASE a ENGINE=Atomic;\n");
    let mut migrations = MigrationDir::load(dir.path()).unwrap();
    migrations.rehash();
    migrations.write_sum_file().unwrap();

    let client = FakeClient::new();
    let revisions = FakeRevisionStore::default();
    let executor = Executor::new(&client, &revisions, "test-version");
    let ctx = CancellationToken::new();

    let first_run = executor.run(&ctx, &migrations).await.unwrap();
    assert_eq!(first_run[0].status, MigrationStatus::Success);

    let second_run = executor.run(&ctx, &migrations).await.unwrap();
    assert_eq!(second_run[0].status, MigrationStatus::Skipped);
}

#[tokio::test]
async fn revision_store_classifies_rows_from_a_fake_client() {
    let client = FakeClient::new();
    let store = ClickHouseRevisionStore::new(&client);
    let ctx = CancellationToken::new();
    // get_schema/query on the fake client return nothing, so loading
    // revisions against it yields an empty set rather than erroring.
    let set = store.load_revisions(&ctx).await.unwrap();
    assert_eq!(set.status_of("nonexistent"), RevisionStatus::Pending);
}
