//! # Command Line Interface
//!
//! `vaultline` reads, lists, writes and deletes logical paths through a
//! consistency-aware client handle. Reads go through the retrying reader.

pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;

use crate::client::ClientHandleFactory;
use crate::config::{AppConfig, ReadRetryConfig};
use crate::observability::{init_observability, log_config_info};
use crate::retry::{ReadOutcome, RetryingReader};
use output::print_output;

#[derive(Parser)]
#[command(name = "vaultline")]
#[command(about = "Consistency-aware client for Vault-compatible secrets services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Service address override
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// Namespace override
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json or yaml)
    #[arg(short, long, global = true, default_value = "json", value_parser = ["json", "yaml"])]
    pub output: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a path, retrying while it races replication
    #[command(
        after_help = "EXAMPLES:\n    # Read a KV v2 secret\n    vaultline read secret/data/app\n\n    # Give up after three attempts\n    vaultline read secret/data/app --max-attempts 3"
    )]
    Read {
        /// Logical path to read
        path: String,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// List keys under a path
    List {
        /// Logical path to list
        path: String,
    },

    /// Write key=value pairs to a path
    #[command(
        after_help = "EXAMPLES:\n    # Write two fields\n    vaultline write secret/app username=app password=s3cret\n\n    # Write, then read back through a second handle\n    vaultline write secret/app username=app --read-back"
    )]
    Write {
        /// Logical path to write
        path: String,

        /// Fields as key=value
        #[arg(required = true, value_name = "KEY=VALUE")]
        fields: Vec<String>,

        /// Read the path back through a cloned handle after writing
        #[arg(long)]
        read_back: bool,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Delete a path
    Delete {
        /// Logical path to delete
        path: String,
    },
}

/// Retry overrides for reads
#[derive(Args, Debug, Clone, Default)]
pub struct RetryArgs {
    /// Attempts before giving up (0 and 1 both mean a single try)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Minimum wait between attempts in milliseconds
    #[arg(long)]
    pub min_wait_ms: Option<u64>,

    /// Maximum wait between attempts in milliseconds
    #[arg(long)]
    pub max_wait_ms: Option<u64>,
}

impl RetryArgs {
    fn apply(&self, config: &ReadRetryConfig) -> ReadRetryConfig {
        ReadRetryConfig {
            max_attempts: self.max_attempts.unwrap_or(config.max_attempts),
            min_wait_ms: self.min_wait_ms.unwrap_or(config.min_wait_ms),
            max_wait_ms: self.max_wait_ms.unwrap_or(config.max_wait_ms),
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(address) = cli.address {
        config.transport.address = address;
    }
    if let Some(namespace) = cli.namespace {
        config.transport.namespace = Some(namespace);
    }
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    config.validate()?;

    let metrics = init_observability(&config.observability)?;
    log_config_info(&config);

    let factory = ClientHandleFactory::construct_with_metrics(config.transport.clone(), metrics)?;

    match cli.command {
        Commands::Read { path, retry } => {
            let reader = retrying_reader(&config, &retry, metrics)?;
            let outcome: ReadOutcome<Value> = reader.read(factory.handle(), &path).await?;
            info!(path = %path, retries = outcome.retries(), "Read complete");
            print_output(&outcome.payload, &cli.output)?;
        }
        Commands::List { path } => {
            let response = factory.handle().list(&path).await?;
            let keys: Value = response.decode(&path)?;
            print_output(&keys, &cli.output)?;
        }
        Commands::Write { path, fields, read_back, retry } => {
            let body = parse_fields(&fields)?;
            let response = factory.handle().write(&path, &body).await?;

            if read_back {
                let sibling = factory.clone_handle().context("Failed to clone client handle")?;
                let reader = retrying_reader(&config, &retry, metrics)?;
                let outcome: ReadOutcome<Value> = reader.read(&sibling, &path).await?;
                info!(path = %path, retries = outcome.retries(), "Read back complete");
                print_output(&outcome.payload, &cli.output)?;
            } else if let Some(data) = response.and_then(|r| r.data) {
                print_output(&data, &cli.output)?;
            } else {
                println!("Wrote {}", path);
            }
        }
        Commands::Delete { path } => {
            factory.handle().delete(&path).await?;
            println!("Deleted {}", path);
        }
    }

    Ok(())
}

fn retrying_reader(
    config: &AppConfig,
    args: &RetryArgs,
    metrics: crate::observability::MetricsRecorder,
) -> anyhow::Result<RetryingReader> {
    let retry = args.apply(&config.read_retry);
    validator::Validate::validate(&retry).context("Invalid retry options")?;
    Ok(RetryingReader::new(retry.to_policy()).with_metrics(metrics))
}

/// Turn `key=value` arguments into a JSON object. Later keys win.
fn parse_fields(fields: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut body = Map::new();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("Field '{}' must be written as key=value", field))?;
        if key.is_empty() {
            anyhow::bail!("Field '{}' has an empty key", field);
        }
        body.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(body)
}
