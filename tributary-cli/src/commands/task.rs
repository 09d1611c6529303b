//! Tracked task handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use serde_json::json;
use tributary_core::domain::run::PipelineRun;
use tributary_runner::service::EventRecorder;
use tributary_runner::tasks::{DbtTask, SparkTask, TaskContext, TrackedTask, execute_tracked};

use crate::config::Config;

/// Pipeline name recorded for tasks run from the CLI
const TASK_PIPELINE: &str = "lineage_tracked_dag";

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Build dbt models
    Dbt {
        #[arg(long, default_value = "run_dbt")]
        id: String,

        #[arg(long, default_value = "transactions_raw")]
        dataset: String,

        /// Models to build (defaults to the task's own list)
        #[arg(long = "model")]
        models: Vec<String>,
    },
    /// Submit a Spark aggregation job
    Spark {
        #[arg(long, default_value = "run_spark")]
        id: String,

        #[arg(long, default_value = "transactions_raw")]
        dataset: String,

        #[arg(long)]
        job_id: Option<String>,
    },
}

pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    match command {
        TaskCommands::Dbt {
            id,
            dataset,
            models,
        } => {
            let mut ctx = context(config, &dataset).await?;
            if !models.is_empty() {
                ctx = ctx.with_param("models", json!(models));
            }
            run_task(&DbtTask::new(id), config, ctx).await
        }
        TaskCommands::Spark {
            id,
            dataset,
            job_id,
        } => {
            let mut ctx = context(config, &dataset).await?;
            if let Some(job_id) = job_id {
                ctx = ctx.with_param("job_id", json!(job_id));
            }
            run_task(&SparkTask::new(id), config, ctx).await
        }
    }
}

async fn context(config: &Config, dataset: &str) -> Result<TaskContext> {
    let correlation_id = config
        .api()
        .generate_correlation_id()
        .await
        .context("Failed to obtain a correlation id")?;

    Ok(TaskContext::new(PipelineRun::new(
        correlation_id,
        dataset,
        TASK_PIPELINE,
    )))
}

async fn run_task(task: &dyn TrackedTask, config: &Config, mut ctx: TaskContext) -> Result<()> {
    let api = config.api();
    let recorder = EventRecorder::new(api.clone());

    println!(
        "{}",
        format!("Running {} task {}:", task.kind(), task.id()).bold()
    );
    println!(
        "  Correlation ID: {}",
        ctx.run.correlation_id().to_string().cyan()
    );

    let output = execute_tracked(task, &recorder, &api, &mut ctx).await?;

    println!("  Status:         {}", output.status.green());
    if let Some(lineage) = &output.lineage {
        println!(
            "  Lineage:        {} {} {} {} {}",
            lineage.input,
            "→".dimmed(),
            lineage.transformation.cyan(),
            "→".dimmed(),
            lineage.output
        );
    }
    for (key, value) in &output.details {
        println!("  {} = {}", key.cyan(), value);
    }

    Ok(())
}
