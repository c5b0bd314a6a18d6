//! The narrow ClickHouse client contract the core consumes (spec §6).
//!
//! [`ClickHouseClient`] is a trait so the differ/executor tests can swap
//! in a fake; [`HttpClickHouseClient`] is the real implementation over
//! ClickHouse's HTTP interface.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    ast::Sql,
    config::ClickHouseClientConfig,
    error::{HousekeeperError, Result}
};

const DEFAULT_IGNORED_DATABASES: &[&str] = &["system", "INFORMATION_SCHEMA", "information_schema", "housekeeper"];

/// One row of a `query()` result set, as raw tab-separated text fields —
/// callers that need typed rows parse the fields they care about.
pub type Row = Vec<String>;

/// The minimal contract the core consumes. Every operation takes an
/// explicit [`CancellationToken`] (design note §9: context propagation).
#[async_trait]
pub trait ClickHouseClient: Send + Sync {
    /// Run a `SELECT` and return its rows.
    async fn query(&self, ctx: &CancellationToken, sql: &str) -> Result<Vec<Row>>;

    /// Run a DDL/DML statement for its side effect.
    async fn execute(&self, ctx: &CancellationToken, sql: &str) -> Result<()>;

    /// Dump the live schema as a parsed AST, excluding `system`,
    /// `INFORMATION_SCHEMA`, `housekeeper`, and any caller-provided
    /// database names.
    async fn get_schema(&self, ctx: &CancellationToken, ignore_databases: &[String]) -> Result<Sql>;

    async fn close(&self);
}

/// `reqwest`-backed client talking to ClickHouse's HTTP interface
/// (`POST /?query=...`).
pub struct HttpClickHouseClient {
    base_url: String,
    client:   reqwest::Client
}

impl HttpClickHouseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client:   reqwest::Client::builder().timeout(Duration::from_secs(30)).build().expect("reqwest client")
        }
    }

    /// Build from engine-level connection settings (spec "Configuration":
    /// user/password/database become query-string credentials on
    /// ClickHouse's HTTP interface; `max_retries` is presently capped at
    /// the client's fixed retry-once policy regardless of its value).
    pub fn from_config(config: &ClickHouseClientConfig) -> Self {
        let mut base_url = config.url.clone();
        let mut params = Vec::new();
        if let Some(database) = &config.database {
            params.push(format!("database={database}"));
        }
        if let Some(user) = &config.user {
            params.push(format!("user={user}"));
        }
        if let Some(password) = &config.password {
            params.push(format!("password={password}"));
        }
        if !params.is_empty() {
            base_url.push(if base_url.contains('?') { '&' } else { '?' });
            base_url.push_str(&params.join("&"));
        }
        Self { base_url, client: reqwest::Client::builder().timeout(config.timeout()).build().expect("reqwest client") }
    }

    /// POST `sql`, retrying once on a transport-level failure (spec
    /// §7: "connection setup may retry once on transport error"). A
    /// statement ClickHouse rejects (bad syntax, constraint violation) is
    /// not a transport failure and is never retried.
    async fn post(&self, sql: &str) -> Result<String> {
        match self.post_once(sql).await {
            Ok(body) => Ok(body),
            Err(first_err @ HousekeeperError::Transport(_)) => {
                warn!(error = %first_err, "clickhouse request failed, retrying once");
                self.post_once(sql).await.map_err(|_| first_err)
            }
            Err(other) => Err(other)
        }
    }

    /// A non-2xx response carries a statement-level rejection, surfaced as
    /// [`HousekeeperError::Execution`] with placeholder `version`/
    /// `statement_index` — the executor, which knows which migration and
    /// statement is in flight, fills those in before recording the
    /// failure.
    async fn post_once(&self, sql: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .body(sql.to_string())
            .send()
            .await
            .map_err(|e| HousekeeperError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HousekeeperError::Execution {
                version:         String::new(),
                statement_index: 0,
                sql:             sql.to_string(),
                cause:           format!("clickhouse returned {status}: {body}")
            });
        }
        response.text().await.map_err(|e| HousekeeperError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ClickHouseClient for HttpClickHouseClient {
    async fn query(&self, ctx: &CancellationToken, sql: &str) -> Result<Vec<Row>> {
        if ctx.is_cancelled() {
            return Err(HousekeeperError::Cancelled { version: None });
        }
        debug!(sql, "querying clickhouse");
        let format_sql = format!("{} FORMAT TabSeparated", sql.trim_end_matches(';'));
        let body = self.post(&format_sql).await?;
        Ok(body.lines().map(|line| line.split('\t').map(str::to_string).collect()).collect())
    }

    async fn execute(&self, ctx: &CancellationToken, sql: &str) -> Result<()> {
        if ctx.is_cancelled() {
            return Err(HousekeeperError::Cancelled { version: None });
        }
        debug!(sql, "executing ddl statement");
        self.post(sql).await?;
        Ok(())
    }

    async fn get_schema(&self, ctx: &CancellationToken, ignore_databases: &[String]) -> Result<Sql> {
        let ignored: Vec<String> =
            DEFAULT_IGNORED_DATABASES.iter().map(|s| s.to_string()).chain(ignore_databases.iter().cloned()).collect();
        let in_list = ignored.iter().map(|d| format!("'{d}'")).collect::<Vec<_>>().join(", ");

        let mut ddl = String::new();

        let db_rows = self
            .query(ctx, &format!("SELECT name, engine FROM system.databases WHERE name NOT IN ({in_list})"))
            .await?;
        for row in db_rows {
            let (Some(name), Some(engine)) = (row.first(), row.get(1)) else { continue };
            ddl.push_str(&format!("CREATE DATABASE {name} ENGINE = {engine};\n"));
        }

        let table_rows = self
            .query(
                ctx,
                &format!("SELECT create_table_query FROM system.tables WHERE database NOT IN ({in_list}) AND create_table_query != ''")
            )
            .await?;
        for row in table_rows {
            if let Some(create_stmt) = row.first().filter(|s| !s.is_empty()) {
                ddl.push_str(create_stmt);
                if !create_stmt.ends_with(';') {
                    ddl.push(';');
                }
                ddl.push('\n');
            }
        }

        let dict_rows = self
            .query(
                ctx,
                &format!("SELECT create_table_query FROM system.dictionaries WHERE database NOT IN ({in_list}) AND create_table_query != ''")
            )
            .await?;
        for row in dict_rows {
            if let Some(create_stmt) = row.first().filter(|s| !s.is_empty()) {
                ddl.push_str(create_stmt);
                if !create_stmt.ends_with(';') {
                    ddl.push(';');
                }
                ddl.push('\n');
            }
        }

        crate::parser::parse(&ddl)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_databases_include_the_tracking_database() {
        assert!(DEFAULT_IGNORED_DATABASES.contains(&"housekeeper"));
    }

    #[test]
    fn from_config_appends_credentials_as_query_params() {
        let mut config = ClickHouseClientConfig::new("http://localhost:8123");
        config.database = Some("d".into());
        config.user = Some("u".into());
        let client = HttpClickHouseClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:8123?database=d&user=u");
    }
}
