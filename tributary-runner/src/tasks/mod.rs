//! Lineage-tracked scheduler tasks
//!
//! A tracked task is a unit of work run by the workflow scheduler whose
//! lifecycle is mirrored into the event store: a `start` event before it
//! runs, then either an `end` event plus its lineage record, or a `failed`
//! event. Bookkeeping failures are logged and never fail the task itself.

mod dbt;
mod spark;

pub use dbt::DbtTask;
pub use spark::SparkTask;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};
use thiserror::Error;
use tracing::{info, warn};
use tributary_client::NodeApi;
use tributary_core::domain::event::EventStatus;
use tributary_core::domain::lineage::LineageRecord;
use tributary_core::domain::run::PipelineRun;

use crate::service::EventRecorder;

/// Everything a task may look at while running
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub run: PipelineRun,
    /// Free-form parameters from the DAG run configuration
    pub params: Map<String, JsonValue>,
}

impl TaskContext {
    pub fn new(run: PipelineRun) -> Self {
        Self {
            run,
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(JsonValue::as_str)
    }
}

/// Result of a task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<LineageRecord>,
    #[serde(flatten)]
    pub details: Map<String, JsonValue>,
}

impl TaskOutput {
    pub fn success(lineage: LineageRecord) -> Self {
        Self {
            status: "success".to_string(),
            lineage: Some(lineage),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// The output as event details
    fn to_details(&self) -> Map<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{task_id}' failed: {message}")]
    Failed { task_id: String, message: String },

    #[error("task '{task_id}' is missing parameter '{param}'")]
    MissingParam { task_id: String, param: String },
}

/// A scheduler task whose lifecycle is recorded
#[async_trait]
pub trait TrackedTask: Send + Sync {
    fn id(&self) -> &str;

    /// Short task type name, e.g. `dbt`
    fn kind(&self) -> &'static str;

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, TaskError>;
}

/// Runs `task` with lifecycle tracking
///
/// On success three records are written: the `start` event, the `end` event
/// carrying the task output, and the task's lineage. On failure a `failed`
/// event with the error replaces the last two and the error is returned.
pub async fn execute_tracked(
    task: &dyn TrackedTask,
    recorder: &EventRecorder,
    api: &NodeApi,
    ctx: &mut TaskContext,
) -> Result<TaskOutput, TaskError> {
    let mut details = Map::new();
    details.insert("task_id".to_string(), json!(task.id()));
    details.insert("task_type".to_string(), json!(task.kind()));
    if let Err(e) = recorder
        .record(&mut ctx.run, EventStatus::Start, details)
        .await
    {
        warn!(task_id = %task.id(), error = %e, "Failed to emit start event");
    }

    info!(
        task_id = %task.id(),
        task_type = task.kind(),
        correlation_id = %ctx.run.correlation_id(),
        "Running task"
    );

    match task.run(ctx).await {
        Ok(output) => {
            let mut details = output.to_details();
            details.insert("task_id".to_string(), json!(task.id()));
            if let Err(e) = recorder.record(&mut ctx.run, EventStatus::End, details).await {
                warn!(task_id = %task.id(), error = %e, "Failed to emit end event");
            }

            if let Some(lineage) = &output.lineage {
                if let Err(e) = api.record_lineage(&ctx.run.dataset, lineage).await {
                    warn!(task_id = %task.id(), error = %e, "Failed to record lineage");
                }
            }

            info!(task_id = %task.id(), status = %output.status, "Task finished");
            Ok(output)
        }
        Err(error) => {
            let mut details = Map::new();
            details.insert("task_id".to_string(), json!(task.id()));
            details.insert("error".to_string(), json!(error.to_string()));
            if let Err(e) = recorder
                .record(&mut ctx.run, EventStatus::Failed, details)
                .await
            {
                warn!(task_id = %task.id(), error = %e, "Failed to emit failed event");
            }

            warn!(task_id = %task.id(), error = %error, "Task failed");
            Err(error)
        }
    }
}
