//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod configs;
mod correlation;
mod events;
mod lineage;
mod run;
mod task;

pub use configs::ConfigCommands;
pub use run::RunArgs;
pub use task::TaskCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde_json::Value as JsonValue;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Execute one pipeline run
    Run(RunArgs),
    /// List the events recorded for a run
    Events {
        /// Dataset the run processed
        dataset: String,
        /// Correlation id of the run
        correlation_id: String,
    },
    /// Show lineage of a dataset or storage location
    Lineage {
        dataset: String,
    },
    /// Query configuration held by the node service
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Obtain a fresh correlation id
    Correlation,
    /// Run a lineage-tracked scheduler task
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run_command(args, config).await,
        Commands::Events {
            dataset,
            correlation_id,
        } => events::handle_events_command(&dataset, &correlation_id, config).await,
        Commands::Lineage { dataset } => lineage::handle_lineage_command(&dataset, config).await,
        Commands::Config { command } => configs::handle_config_command(command, config).await,
        Commands::Correlation => correlation::handle_correlation_command(config).await,
        Commands::Task { command } => task::handle_task_command(command, config).await,
    }
}

/// Print a JSON value indented under a heading
fn print_json(title: &str, value: &JsonValue) {
    println!("{}", title.bold());
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => {
            for line in pretty.lines() {
                println!("  {}", line);
            }
        }
        Err(_) => println!("  {:?}", value),
    }
}
