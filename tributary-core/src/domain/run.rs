//! Pipeline run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default pipeline name used for runs and as the lineage transformation id
pub const DEFAULT_PIPELINE_NAME: &str = "data_engineering_pipeline";

/// Opaque run identifier issued by the node service
///
/// Every event and lineage record of one run carries the same id. Ids are
/// generated remotely so concurrent coordinators never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// One execution of the pipeline
///
/// Owned exclusively by the task driving it. The correlation id is fixed at
/// construction; status moves forward until it reaches a terminal value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    correlation_id: CorrelationId,
    pub dataset: String,
    pub pipeline_name: String,
    pub start_time: DateTime<Utc>,
    status: RunStatus,
    /// Last timestamp handed out by `next_timestamp`
    #[serde(skip)]
    last_timestamp: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Creates a pending run starting now
    pub fn new(
        correlation_id: CorrelationId,
        dataset: impl Into<String>,
        pipeline_name: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id,
            dataset: dataset.into(),
            pipeline_name: pipeline_name.into(),
            start_time: Utc::now(),
            status: RunStatus::Pending,
            last_timestamp: None,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Moves the run to `next`
    ///
    /// Returns `false` and leaves the status untouched when the run is
    /// already terminal.
    pub fn transition(&mut self, next: RunStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        true
    }

    /// Returns a fresh event timestamp for this run
    ///
    /// Timestamps never go backwards within a run, even if the wall clock does.
    pub fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn run() -> PipelineRun {
        PipelineRun::new(
            CorrelationId::new("corr-1"),
            "transactions_raw",
            DEFAULT_PIPELINE_NAME,
        )
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = run();
        assert_eq!(run.status(), RunStatus::Pending);
        assert_eq!(run.correlation_id().as_str(), "corr-1");
        assert_eq!(run.pipeline_name, "data_engineering_pipeline");
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut run = run();
        assert!(run.transition(RunStatus::Running));
        assert!(run.transition(RunStatus::Failed));
        assert!(!run.transition(RunStatus::Succeeded));
        assert_eq!(run.status(), RunStatus::Failed);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut run = run();
        // Simulate a clock that previously ran ahead
        let ahead = Utc::now() + Duration::hours(1);
        run.last_timestamp = Some(ahead);

        let first = run.next_timestamp();
        let second = run.next_timestamp();
        assert_eq!(first, ahead);
        assert!(second >= first);
    }

    #[test]
    fn test_correlation_id_serializes_as_plain_string() {
        let id = CorrelationId::new("corr-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"corr-42\"");
        assert_eq!(id.to_string(), "corr-42");
    }
}
