//! Tributary Runner binary
//!
//! Loads configuration, launches the configured number of pipeline runs side
//! by side, and exits non-zero when any of them failed. SIGINT and SIGTERM
//! cancel runs in flight at their next step boundary.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tributary_client::{NodeClient, RemoteInvoker};
use tributary_runner::config::Config;
use tributary_runner::orchestrator::LogProgress;
use tributary_runner::{PipelineOrchestrator, RunError, RunOutcome, signal};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tributary_runner=info,tributary_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tributary Runner");

    let config = load_config()?;
    info!(
        "Loaded configuration: instance_id={}, node_base_url={}, dataset={}, dag_id={}",
        config.instance_id, config.node_base_url, config.dataset, config.dag_id
    );

    let client: Arc<dyn RemoteInvoker> = Arc::new(NodeClient::new(config.client_config()));
    let orchestrator = Arc::new(
        PipelineOrchestrator::new(client, config.pipeline_settings())
            .with_progress(Arc::new(LogProgress)),
    );

    let cancel = CancellationToken::new();
    let shutdown = signal::cancel_on_shutdown(cancel.clone());

    info!("Launching {} pipeline run(s)", config.concurrent_runs);

    let mut runs = JoinSet::new();
    for _ in 0..config.concurrent_runs {
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        runs.spawn(async move { orchestrator.run(&cancel).await });
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut cancelled = 0usize;

    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok(Ok(report)) => match &report.outcome {
                RunOutcome::Succeeded => {
                    succeeded += 1;
                    info!(
                        correlation_id = %report.run.correlation_id(),
                        events = report.events.len(),
                        event_failures = report.event_failures.len(),
                        "Run succeeded"
                    );
                }
                RunOutcome::Failed { step, error } => {
                    failed += 1;
                    error!(
                        correlation_id = %report.run.correlation_id(),
                        step = %step,
                        error = %error,
                        "Run failed"
                    );
                }
                RunOutcome::Cancelled { step } => {
                    cancelled += 1;
                    warn!(
                        correlation_id = %report.run.correlation_id(),
                        step = %step,
                        "Run cancelled"
                    );
                }
            },
            Ok(Err(RunError::Cancelled)) => cancelled += 1,
            Ok(Err(e)) => {
                failed += 1;
                error!("Run could not start: {}", e);
            }
            Err(e) => {
                failed += 1;
                error!("Run task aborted: {}", e);
            }
        }
    }

    shutdown.abort();

    info!(succeeded, failed, cancelled, "All runs finished");

    if failed > 0 {
        anyhow::bail!(
            "{} of {} pipeline run(s) failed",
            failed,
            config.concurrent_runs
        );
    }

    Ok(())
}

/// Loads configuration from environment variables
///
/// Unset variables take their defaults; a malformed one stops the runner.
fn load_config() -> Result<Config> {
    Config::from_env().context("Invalid runner configuration")
}
