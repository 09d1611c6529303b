//! Tributary CLI
//!
//! Command-line interface for operating pipeline runs against the node
//! service: start a run, inspect its events and lineage, and query
//! configuration.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tributary_client::config::{DEFAULT_BASE_URL, DEFAULT_METHOD_PREFIX};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Tributary data pipeline CLI", long_about = None)]
struct Cli {
    /// Node service base URL
    #[arg(long, env = "NODE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    node_url: String,

    /// Path prefix of node methods
    #[arg(long, env = "NODE_METHOD_PREFIX", default_value = DEFAULT_METHOD_PREFIX)]
    method_prefix: String,

    /// Per-call timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 5)]
    timeout: u64,

    /// Attempts per call, including the first
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value_t = 1)]
    attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, env = "RETRY_INITIAL_BACKOFF_MS", default_value_t = 500)]
    initial_backoff_ms: u64,

    /// Upper bound for any retry delay, in milliseconds
    #[arg(long, env = "RETRY_MAX_BACKOFF_MS", default_value_t = 30_000)]
    max_backoff_ms: u64,

    /// Also retry POST calls (may duplicate recorded events)
    #[arg(long, env = "RETRY_POST")]
    retry_post: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        node_url: cli.node_url,
        method_prefix: cli.method_prefix,
        timeout_secs: cli.timeout,
        attempts: cli.attempts,
        initial_backoff_ms: cli.initial_backoff_ms,
        max_backoff_ms: cli.max_backoff_ms,
        retry_post: cli.retry_post,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
