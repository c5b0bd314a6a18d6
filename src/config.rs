//! Engine-level configuration structs.
//!
//! CLI argument parsing and file-based config loading are out of scope
//! (spec §1): these are the plain structs an external caller constructs
//! and hands to [`crate::client::HttpClickHouseClient`] and
//! [`crate::executor::Executor`]. Nothing in this module reads a file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection parameters for [`crate::client::HttpClickHouseClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseClientConfig {
    pub url:         String,
    #[serde(default)]
    pub database:    Option<String>,
    #[serde(default)]
    pub user:        Option<String>,
    #[serde(default)]
    pub password:    Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

impl ClickHouseClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url:          url.into(),
            database:     None,
            user:         None,
            password:     None,
            timeout_secs: default_timeout_secs(),
            max_retries:  default_max_retries()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Run-level knobs for [`crate::executor::Executor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub cluster:             Option<String>,
    #[serde(default)]
    pub dry_run:             bool,
    pub housekeeper_version: String
}

impl ExecutorConfig {
    pub fn new(housekeeper_version: impl Into<String>) -> Self {
        Self { cluster: None, dry_run: false, housekeeper_version: housekeeper_version.into() }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults_retry_once() {
        let cfg = ClickHouseClientConfig::new("http://localhost:8123");
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn executor_config_defaults_to_crate_version() {
        let cfg = ExecutorConfig::default();
        assert!(!cfg.dry_run);
        assert_eq!(cfg.housekeeper_version, env!("CARGO_PKG_VERSION"));
    }
}
