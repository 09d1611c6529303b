//! Pipeline orchestrator
//!
//! Drives one pipeline run through its steps in a fixed order:
//!
//! 1. fetch process config
//! 2. fetch dataset config
//! 3. record the start event
//! 4. fetch DAG config, then trigger the DAG
//! 5. process data
//! 6. record lineage
//! 7. query lineage
//! 8. record the end event
//!
//! Each step's remote call must succeed with a usable answer before the next
//! one begins. The first failure halts the run; nothing already applied on
//! the remote side is rolled back. A cancellation token is checked before
//! every step so a cancelled run stops before its next remote call.

mod progress;
mod step;

pub use progress::{LogProgress, NoProgress, Progress, ProgressReporter};
pub use step::{Step, VISIBLE_STEPS};

use chrono::Utc;
use serde_json::{Map, Value as JsonValue, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tributary_client::{InvokeError, NodeApi, RemoteInvoker};
use tributary_core::domain::dataset::DatasetConfig;
use tributary_core::domain::event::{Event, EventStatus};
use tributary_core::domain::lineage::LineageRecord;
use tributary_core::domain::run::{DEFAULT_PIPELINE_NAME, PipelineRun, RunStatus};
use tributary_core::dto::dag::{DagConf, TriggerAck, TriggerDagRequest};
use tributary_core::dto::lineage::LineageInfo;

use crate::service::{
    CorrelationSource, EventRecorder, ProcessingOutcome, ProcessingStrategy,
    RemoteCorrelationSource, SimulatedProcessing,
};

/// What to do when a milestone or end event cannot be recorded
///
/// A failed start event always aborts the run, whatever the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventFailurePolicy {
    /// Log the failure, keep it on the report, and carry on
    #[default]
    Continue,
    /// Fail the run at the step that emitted the event
    Abort,
}

impl FromStr for EventFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(EventFailurePolicy::Continue),
            "abort" => Ok(EventFailurePolicy::Abort),
            other => Err(format!(
                "unknown event failure policy '{}' (expected 'continue' or 'abort')",
                other
            )),
        }
    }
}

impl fmt::Display for EventFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFailurePolicy::Continue => f.write_str("continue"),
            EventFailurePolicy::Abort => f.write_str("abort"),
        }
    }
}

/// Per-pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub dataset: String,
    pub pipeline_name: String,
    pub dag_id: String,
    /// Identity of this coordinator, passed to the triggered DAG
    pub requested_by: String,
    pub event_failure_policy: EventFailurePolicy,
}

impl PipelineSettings {
    pub fn new(dataset: impl Into<String>, dag_id: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            dag_id: dag_id.into(),
            requested_by: "tributary".to_string(),
            event_failure_policy: EventFailurePolicy::default(),
        }
    }
}

/// Error that prevents a run from existing at all
#[derive(Debug, Error)]
pub enum RunError {
    /// No correlation id could be obtained; no step was executed
    #[error("failed to obtain a correlation id: {0}")]
    Correlation(#[source] InvokeError),

    /// Cancelled before a correlation id was requested
    #[error("run cancelled before it started")]
    Cancelled,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Succeeded,
    /// `step` failed with `error`; no later step was executed
    Failed { step: Step, error: InvokeError },
    /// Cancellation was observed before `step`
    Cancelled { step: Step },
}

/// An event that could not be recorded while the run carried on
#[derive(Debug, Clone)]
pub struct EventFailure {
    pub status: EventStatus,
    pub error: InvokeError,
}

/// Results gathered by the steps that completed
#[derive(Debug, Clone, Default)]
pub struct RunArtifacts {
    pub process_config: Option<JsonValue>,
    pub dataset_config: Option<DatasetConfig>,
    pub dag_config: Option<JsonValue>,
    pub dag_conf: Option<DagConf>,
    pub trigger_ack: Option<TriggerAck>,
    pub processing: Option<ProcessingOutcome>,
    pub lineage: Option<LineageRecord>,
    pub lineage_info: Option<LineageInfo>,
}

/// Final state of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: PipelineRun,
    pub outcome: RunOutcome,
    /// Steps that completed, in order
    pub completed_steps: Vec<Step>,
    pub artifacts: RunArtifacts,
    /// Events recorded, in emission order
    pub events: Vec<Event>,
    pub event_failures: Vec<EventFailure>,
}

impl RunReport {
    /// Whether every step completed
    ///
    /// Under [`EventFailurePolicy::Continue`] a succeeded run may still be
    /// missing its `end` event in the audit trail; see [`Self::fully_recorded`].
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded)
    }

    /// Whether the run succeeded and its `end` event was stored
    pub fn fully_recorded(&self) -> bool {
        self.succeeded()
            && !self
                .event_failures
                .iter()
                .any(|failure| failure.status == EventStatus::End)
    }

    /// The step that halted the run, if any
    pub fn failed_step(&self) -> Option<Step> {
        match &self.outcome {
            RunOutcome::Failed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Reason the step sequence stopped early
enum Halt {
    Failed(Step, InvokeError),
    Cancelled(Step),
}

/// Mutable state of one run, owned by the task driving it
struct RunState {
    run: PipelineRun,
    completed_steps: Vec<Step>,
    visible_completed: usize,
    artifacts: RunArtifacts,
    events: Vec<Event>,
    event_failures: Vec<EventFailure>,
    start_recorded: bool,
}

impl RunState {
    fn new(run: PipelineRun) -> Self {
        Self {
            run,
            completed_steps: Vec::new(),
            visible_completed: 0,
            artifacts: RunArtifacts::default(),
            events: Vec::new(),
            event_failures: Vec::new(),
            start_recorded: false,
        }
    }

    fn into_report(self, outcome: RunOutcome) -> RunReport {
        RunReport {
            run: self.run,
            outcome,
            completed_steps: self.completed_steps,
            artifacts: self.artifacts,
            events: self.events,
            event_failures: self.event_failures,
        }
    }
}

/// Drives pipeline runs against the node service
///
/// The orchestrator holds no per-run state and can drive many runs
/// concurrently; each call to [`run`](Self::run) owns its own run.
pub struct PipelineOrchestrator {
    api: NodeApi,
    recorder: EventRecorder,
    correlation: Arc<dyn CorrelationSource>,
    processing: Arc<dyn ProcessingStrategy>,
    progress: Arc<dyn ProgressReporter>,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator using remote correlation ids, simulated
    /// processing and no progress reporting
    pub fn new(invoker: Arc<dyn RemoteInvoker>, settings: PipelineSettings) -> Self {
        let api = NodeApi::new(invoker);
        Self {
            recorder: EventRecorder::new(api.clone()),
            correlation: Arc::new(RemoteCorrelationSource::new(api.clone())),
            processing: Arc::new(SimulatedProcessing),
            progress: Arc::new(NoProgress),
            api,
            settings,
        }
    }

    pub fn with_correlation_source(mut self, source: Arc<dyn CorrelationSource>) -> Self {
        self.correlation = source;
        self
    }

    pub fn with_processing(mut self, strategy: Arc<dyn ProcessingStrategy>) -> Self {
        self.processing = strategy;
        self
    }

    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Executes one pipeline run
    ///
    /// # Returns
    /// A report for every run that obtained a correlation id, whether it
    /// succeeded, failed, or was cancelled. `Err` means no run was started.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let correlation_id = self
            .correlation
            .new_run()
            .await
            .map_err(RunError::Correlation)?;

        let mut run = PipelineRun::new(
            correlation_id,
            self.settings.dataset.clone(),
            self.settings.pipeline_name.clone(),
        );
        run.transition(RunStatus::Running);

        info!(
            correlation_id = %run.correlation_id(),
            dataset = %run.dataset,
            pipeline = %run.pipeline_name,
            "Pipeline run started"
        );

        let mut state = RunState::new(run);

        let outcome = match self.drive(&mut state, cancel).await {
            Ok(()) => {
                state.run.transition(RunStatus::Succeeded);
                info!(
                    correlation_id = %state.run.correlation_id(),
                    event_failures = state.event_failures.len(),
                    "Pipeline run succeeded"
                );
                RunOutcome::Succeeded
            }
            Err(Halt::Failed(step, error)) => {
                self.fail(&mut state, step, &error).await;
                RunOutcome::Failed { step, error }
            }
            Err(Halt::Cancelled(step)) => {
                state.run.transition(RunStatus::Cancelled);
                warn!(
                    correlation_id = %state.run.correlation_id(),
                    step = %step,
                    "Pipeline run cancelled"
                );
                RunOutcome::Cancelled { step }
            }
        };

        Ok(state.into_report(outcome))
    }

    /// Runs every step in order, stopping at the first failure
    async fn drive(&self, state: &mut RunState, cancel: &CancellationToken) -> Result<(), Halt> {
        let settings = &self.settings;

        self.enter(Step::FetchProcessConfig, state, cancel)?;
        let process_config = self
            .api
            .process_config()
            .await
            .map_err(|e| Halt::Failed(Step::FetchProcessConfig, e))?;
        state.artifacts.process_config = Some(process_config);
        self.complete(Step::FetchProcessConfig, state);

        self.enter(Step::FetchDatasetConfig, state, cancel)?;
        let dataset_config = self
            .api
            .dataset_config(&settings.dataset)
            .await
            .map_err(|e| Halt::Failed(Step::FetchDatasetConfig, e))?;
        state.artifacts.dataset_config = Some(dataset_config.clone());
        self.complete(Step::FetchDatasetConfig, state);

        self.enter(Step::RecordStart, state, cancel)?;
        let mut details = Map::new();
        details.insert("source".to_string(), json!(dataset_config.source));
        details.insert("destination".to_string(), json!(dataset_config.destination));
        let start = self
            .recorder
            .record(&mut state.run, EventStatus::Start, details)
            .await
            .map_err(|e| Halt::Failed(Step::RecordStart, e))?;
        state.events.push(start);
        state.start_recorded = true;
        self.complete(Step::RecordStart, state);

        self.enter(Step::FetchDagConfig, state, cancel)?;
        let dag_config = self
            .api
            .dag_config(&settings.dag_id)
            .await
            .map_err(|e| Halt::Failed(Step::FetchDagConfig, e))?;
        let mut details = Map::new();
        details.insert("dag_id".to_string(), json!(settings.dag_id));
        details.insert("dag_config".to_string(), dag_config.clone());
        state.artifacts.dag_config = Some(dag_config);
        self.emit(state, EventStatus::DagConfigRetrieved, details)
            .await
            .map_err(|e| Halt::Failed(Step::FetchDagConfig, e))?;
        self.complete(Step::FetchDagConfig, state);

        self.enter(Step::TriggerDag, state, cancel)?;
        let request = TriggerDagRequest {
            dag_id: settings.dag_id.clone(),
            conf: DagConf {
                dataset: state.run.dataset.clone(),
                correlation_id: state.run.correlation_id().to_string(),
                requested_at: Utc::now(),
                requested_by: settings.requested_by.clone(),
            },
        };
        let ack = self
            .api
            .trigger_dag(&request)
            .await
            .map_err(|e| Halt::Failed(Step::TriggerDag, e))?;
        let mut details = Map::new();
        details.insert("dag_id".to_string(), json!(settings.dag_id));
        details.insert("dag_conf".to_string(), json!(request.conf));
        details.insert("dag_trigger_response".to_string(), json!(ack));
        state.artifacts.dag_conf = Some(request.conf);
        state.artifacts.trigger_ack = Some(ack);
        self.emit(state, EventStatus::DagTriggered, details)
            .await
            .map_err(|e| Halt::Failed(Step::TriggerDag, e))?;
        self.complete(Step::TriggerDag, state);

        self.enter(Step::ProcessData, state, cancel)?;
        let processing = self.processing.process(&dataset_config).await;
        state.artifacts.processing = Some(processing);
        self.complete(Step::ProcessData, state);

        self.enter(Step::RecordLineage, state, cancel)?;
        let lineage = LineageRecord::for_dataset(
            &dataset_config,
            state.run.pipeline_name.clone(),
            processing.rows_processed,
        );
        self.api
            .record_lineage(&state.run.dataset, &lineage)
            .await
            .map_err(|e| Halt::Failed(Step::RecordLineage, e))?;
        let mut details = Map::new();
        details.insert("lineage_data".to_string(), json!(lineage));
        state.artifacts.lineage = Some(lineage);
        self.emit(state, EventStatus::LineageRecorded, details)
            .await
            .map_err(|e| Halt::Failed(Step::RecordLineage, e))?;
        self.complete(Step::RecordLineage, state);

        self.enter(Step::QueryLineage, state, cancel)?;
        let lineage_info = self
            .api
            .get_lineage(&dataset_config.destination)
            .await
            .map_err(|e| Halt::Failed(Step::QueryLineage, e))?;
        state.artifacts.lineage_info = Some(lineage_info);
        self.complete(Step::QueryLineage, state);

        self.enter(Step::RecordEnd, state, cancel)?;
        let mut details = Map::new();
        details.insert("result".to_string(), json!("success"));
        details.insert("rows_processed".to_string(), json!(processing.rows_processed));
        self.emit(state, EventStatus::End, details)
            .await
            .map_err(|e| Halt::Failed(Step::RecordEnd, e))?;
        self.complete(Step::RecordEnd, state);

        Ok(())
    }

    /// State boundary check before a step issues its remote call
    fn enter(
        &self,
        step: Step,
        state: &RunState,
        cancel: &CancellationToken,
    ) -> Result<(), Halt> {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled(step));
        }
        tracing::debug!(
            correlation_id = %state.run.correlation_id(),
            step = %step,
            "Entering step"
        );
        Ok(())
    }

    fn complete(&self, step: Step, state: &mut RunState) {
        state.completed_steps.push(step);
        if step.completes_visible_step() {
            state.visible_completed += 1;
            self.progress
                .step_completed(&Progress::new(step, state.visible_completed));
        }
        info!(
            correlation_id = %state.run.correlation_id(),
            step = %step,
            completed = state.visible_completed,
            total = VISIBLE_STEPS,
            "Step completed"
        );
    }

    /// Records a milestone or end event, applying the event failure policy
    async fn emit(
        &self,
        state: &mut RunState,
        status: EventStatus,
        details: Map<String, JsonValue>,
    ) -> Result<(), InvokeError> {
        match self.recorder.record(&mut state.run, status, details).await {
            Ok(event) => {
                state.events.push(event);
                Ok(())
            }
            Err(error) => match self.settings.event_failure_policy {
                EventFailurePolicy::Continue => {
                    warn!(
                        correlation_id = %state.run.correlation_id(),
                        status = %status,
                        error = %error,
                        "Event not recorded, continuing"
                    );
                    state.event_failures.push(EventFailure { status, error });
                    Ok(())
                }
                EventFailurePolicy::Abort => Err(error),
            },
        }
    }

    /// Marks the run failed and records a best-effort `failed` event
    ///
    /// The failed event is only sent once a start event exists, so every run
    /// visible in the event store is bracketed by start and end or failed.
    async fn fail(&self, state: &mut RunState, step: Step, error: &InvokeError) {
        state.run.transition(RunStatus::Failed);
        self.progress.step_failed(step, error);

        error!(
            correlation_id = %state.run.correlation_id(),
            step = %step,
            error = %error,
            "Pipeline run failed"
        );

        if !state.start_recorded {
            return;
        }

        let mut details = Map::new();
        details.insert("step".to_string(), json!(step.name()));
        details.insert("error".to_string(), json!(error.to_string()));
        details.insert("kind".to_string(), json!(error.kind.to_string()));
        if let Some(status) = error.status {
            details.insert("status_code".to_string(), json!(status));
        }

        match self
            .recorder
            .record(&mut state.run, EventStatus::Failed, details)
            .await
        {
            Ok(event) => state.events.push(event),
            Err(record_error) => {
                warn!(
                    correlation_id = %state.run.correlation_id(),
                    error = %record_error,
                    "Failed event not recorded"
                );
                state.event_failures.push(EventFailure {
                    status: EventStatus::Failed,
                    error: record_error,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests;
