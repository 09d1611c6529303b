//! Lifecycle event domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::domain::run::{CorrelationId, PipelineRun};

/// Lifecycle status carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Start,
    DagConfigRetrieved,
    DagTriggered,
    LineageRecorded,
    End,
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Start => "start",
            EventStatus::DagConfigRetrieved => "dag_config_retrieved",
            EventStatus::DagTriggered => "dag_triggered",
            EventStatus::LineageRecorded => "lineage_recorded",
            EventStatus::End => "end",
            EventStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded lifecycle event
///
/// Append-only: once emitted an event is never modified. The audit store keys
/// events by dataset and `correlationId`, hence the camelCase wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub status: EventStatus,
    pub pipeline: String,
    pub dataset: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "correlationId")]
    pub correlation_id: CorrelationId,
    #[serde(rename = "processStartTime")]
    pub process_start_time: DateTime<Utc>,
    #[serde(default)]
    pub details: Map<String, JsonValue>,
}

impl Event {
    /// Builds an event for `run` stamped with `timestamp`
    pub fn for_run(
        run: &PipelineRun,
        status: EventStatus,
        timestamp: DateTime<Utc>,
        details: Map<String, JsonValue>,
    ) -> Self {
        Self {
            status,
            pipeline: run.pipeline_name.clone(),
            dataset: run.dataset.clone(),
            timestamp,
            correlation_id: run.correlation_id().clone(),
            process_start_time: run.start_time,
            details,
        }
    }
}
