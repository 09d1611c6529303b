//! Pipeline run handler
//!
//! Executes one run in the foreground and renders its progress as it goes.
//! Ctrl-C cancels the run at its next step boundary.

use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tributary_client::InvokeError;
use tributary_core::domain::run::{DEFAULT_PIPELINE_NAME, RunStatus};
use tributary_runner::config::{DEFAULT_DAG_ID, DEFAULT_DATASET};
use tributary_runner::orchestrator::{Progress, ProgressReporter, Step};
use tributary_runner::service::FixedProcessing;
use tributary_runner::{
    EventFailurePolicy, PipelineOrchestrator, PipelineSettings, RunOutcome, RunReport, signal,
};

use super::lineage::print_lineage;
use crate::config::Config;

#[derive(Args)]
pub struct RunArgs {
    /// Dataset to process
    #[arg(long, env = "PIPELINE_DATASET", default_value = DEFAULT_DATASET)]
    dataset: String,

    /// Pipeline name recorded on events and lineage
    #[arg(long, env = "PIPELINE_NAME", default_value = DEFAULT_PIPELINE_NAME)]
    pipeline: String,

    /// DAG to trigger
    #[arg(long, env = "PIPELINE_DAG_ID", default_value = DEFAULT_DAG_ID)]
    dag_id: String,

    /// What to do when a milestone event cannot be recorded (continue, abort)
    #[arg(long, env = "EVENT_FAILURE_POLICY", default_value = "continue")]
    event_failure_policy: EventFailurePolicy,

    /// Report a fixed row count instead of a simulated one
    #[arg(long)]
    rows: Option<u64>,
}

/// Prints each step as it completes
struct TerminalProgress;

impl ProgressReporter for TerminalProgress {
    fn step_completed(&self, progress: &Progress) {
        println!(
            "  {} {} {}",
            format!("[{}/{}]", progress.completed, progress.total).dimmed(),
            "✓".green(),
            progress.step.label()
        );
    }

    fn step_failed(&self, step: Step, error: &InvokeError) {
        println!("  {} {}", "✗".red(), step.label().red());
        println!("    {}", error.to_string().dimmed());
    }
}

pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<()> {
    let settings = PipelineSettings {
        dataset: args.dataset,
        pipeline_name: args.pipeline,
        dag_id: args.dag_id,
        requested_by: "tributary-cli".to_string(),
        event_failure_policy: args.event_failure_policy,
    };

    let mut orchestrator = PipelineOrchestrator::new(config.invoker(), settings)
        .with_progress(Arc::new(TerminalProgress));
    if let Some(rows) = args.rows {
        orchestrator =
            orchestrator.with_processing(Arc::new(FixedProcessing::new(rows, Duration::ZERO)));
    }

    let cancel = CancellationToken::new();
    let shutdown = signal::cancel_on_shutdown(cancel.clone());

    println!(
        "{}",
        format!("Running pipeline on {}:", orchestrator.settings().dataset).bold()
    );
    let result = orchestrator.run(&cancel).await;
    shutdown.abort();

    let report = result?;
    print_report(&report);

    match &report.outcome {
        RunOutcome::Succeeded => Ok(()),
        RunOutcome::Failed { step, .. } => bail!("run failed at step '{}'", step.label()),
        RunOutcome::Cancelled { .. } => bail!("run cancelled"),
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "Run Summary:".bold());
    println!(
        "  Correlation ID: {}",
        report.run.correlation_id().to_string().cyan()
    );
    println!("  Status:         {}", colorize_status(report.run.status()));
    println!(
        "  Started:        {}",
        report.run.start_time.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(processing) = &report.artifacts.processing {
        println!("  Rows processed: {}", processing.rows_processed);
    }
    println!("  Events:         {}", report.events.len());

    if !report.event_failures.is_empty() {
        println!("\n{}", "Events not recorded:".yellow().bold());
        for failure in &report.event_failures {
            println!("  {} {}", failure.status.to_string().yellow(), failure.error);
        }
    }

    if let (Some(info), Some(dataset)) = (
        &report.artifacts.lineage_info,
        &report.artifacts.dataset_config,
    ) {
        println!();
        print_lineage(&dataset.destination, info);
    }

    if let RunOutcome::Failed { error, .. } = &report.outcome {
        println!("\n{}", "Error:".bold());
        println!("{}", error.to_string().red());
    }
}

/// Colorize run status for display
fn colorize_status(status: RunStatus) -> ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        RunStatus::Pending => status_str.yellow(),
        RunStatus::Running => status_str.cyan(),
        RunStatus::Succeeded => status_str.green(),
        RunStatus::Failed => status_str.red(),
        RunStatus::Cancelled => status_str.dimmed(),
    }
}
