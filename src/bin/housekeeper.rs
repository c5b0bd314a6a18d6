//! Thin CLI demonstrating `housekeeper`'s two primary operations.
//!
//! Not a polished tool — the CLI surface is out of scope (spec §1). This
//! binary exists only to prove the library is callable end to end.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use housekeeper::{
    client::{ClickHouseClient, HttpClickHouseClient},
    config::{ClickHouseClientConfig, ExecutorConfig},
    differ,
    error::HousekeeperError,
    executor::Executor,
    migration::MigrationDir,
    revision::ClickHouseRevisionStore
};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "housekeeper")]
#[command(version, about = "ClickHouse schema migration engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff a current schema file against a target schema file and print
    /// the resulting UP statements.
    Diff {
        #[arg(long)]
        current: PathBuf,
        #[arg(long)]
        target:  PathBuf
    },
    /// Apply every migration in a directory against a ClickHouse instance.
    Apply {
        #[arg(long)]
        migrations: PathBuf,
        #[arg(long, env = "HOUSEKEEPER_CLICKHOUSE_URL")]
        url:        String,
        #[arg(long)]
        cluster:    Option<String>,
        #[arg(long)]
        dry_run:    bool
    }
}

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_UNSUPPORTED: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) if e.is_no_diff() => {
            println!("no differences");
            ExitCode::from(EXIT_OK)
        }
        Err(e) if e.is_unsupported() => {
            eprintln!("unsupported operation: {e}");
            ExitCode::from(EXIT_UNSUPPORTED)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<u8, HousekeeperError> {
    match cli.command {
        Command::Diff { current, target } => run_diff(&current, &target),
        Command::Apply { migrations, url, cluster, dry_run } => run_apply(&migrations, &url, cluster, dry_run).await
    }
}

fn run_diff(current_path: &PathBuf, target_path: &PathBuf) -> Result<u8, HousekeeperError> {
    let current_text = std::fs::read_to_string(current_path)?;
    let target_text = std::fs::read_to_string(target_path)?;
    let current = housekeeper::parser::parse(&current_text)?;
    let target = housekeeper::parser::parse(&target_text)?;

    let diffs = differ::diff_schema(&current, &target)?;
    for diff in &diffs {
        for stmt in &diff.forward_sql {
            println!("{stmt}");
        }
    }
    Ok(EXIT_OK)
}

async fn run_apply(migrations_dir: &PathBuf, url: &str, cluster: Option<String>, dry_run: bool) -> Result<u8, HousekeeperError> {
    let dir = MigrationDir::load(migrations_dir)?;
    if !dir.validate() {
        return Err(HousekeeperError::Integrity("migration directory failed sum file validation".into()));
    }

    let client_config = ClickHouseClientConfig::new(url);
    let client = HttpClickHouseClient::from_config(&client_config);

    let mut executor_config = ExecutorConfig::default();
    executor_config.cluster = cluster.clone();
    executor_config.dry_run = dry_run;

    let revision_store = ClickHouseRevisionStore::new(&client);
    let mut executor = Executor::new(&client, &revision_store, executor_config.housekeeper_version.clone()).with_dry_run(dry_run);
    if let Some(cluster) = cluster {
        executor = executor.with_cluster(housekeeper::ast::Ident::new(cluster));
    }

    let ctx = CancellationToken::new();
    let results = executor.run(&ctx, &dir).await?;

    let mut exit = EXIT_OK;
    for result in &results {
        println!(
            "{}: {:?} ({}/{} statements, {}ms)",
            result.version, result.status, result.applied_statements, result.total_statements, result.execution_time_ms
        );
        if let Some(error) = &result.error {
            eprintln!("  error: {error}");
            exit = EXIT_ERROR;
        }
    }
    client.close().await;
    Ok(exit)
}
