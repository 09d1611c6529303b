//! Configuration query handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tributary_core::domain::dataset::DatasetConfig;

use super::print_json;
use crate::config::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the process configuration
    Process,
    /// Show a dataset configuration
    Dataset {
        name: String,
    },
    /// Show a DAG configuration
    Dag {
        id: String,
    },
}

pub async fn handle_config_command(command: ConfigCommands, config: &Config) -> Result<()> {
    let api = config.api();

    match command {
        ConfigCommands::Process => {
            let value = api
                .process_config()
                .await
                .context("Failed to fetch process configuration")?;
            print_json("Process configuration:", &value);
        }
        ConfigCommands::Dataset { name } => {
            let dataset = api
                .dataset_config(&name)
                .await
                .with_context(|| format!("Failed to fetch configuration of dataset '{}'", name))?;
            print_dataset(&dataset);
        }
        ConfigCommands::Dag { id } => {
            let value = api
                .dag_config(&id)
                .await
                .with_context(|| format!("Failed to fetch configuration of DAG '{}'", id))?;
            print_json(&format!("DAG {}:", id), &value);
        }
    }

    Ok(())
}

fn print_dataset(dataset: &DatasetConfig) {
    println!("{}", "Dataset:".bold());
    println!("  Name:        {}", dataset.name.cyan());
    println!("  Source:      {}", dataset.source);
    println!("  Destination: {}", dataset.destination);
    if !dataset.schema.is_empty() {
        println!("  Schema:      {}", dataset.schema.join(", ").dimmed());
    }
    if !dataset.partitions.is_empty() {
        println!("  Partitions:  {}", dataset.partitions.join(", ").dimmed());
    }
}
