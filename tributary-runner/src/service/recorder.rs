//! Event recorder
//!
//! Emits lifecycle events for a run. Every event carries the run's
//! correlation id, dataset, pipeline name and start time, plus a timestamp
//! from the run's clock so events of one run never go back in time.

use serde_json::{Map, Value as JsonValue};
use tracing::debug;
use tributary_client::{InvokeError, NodeApi};
use tributary_core::domain::event::{Event, EventStatus};
use tributary_core::domain::run::PipelineRun;

/// Records events through the node service
#[derive(Clone)]
pub struct EventRecorder {
    api: NodeApi,
}

impl EventRecorder {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Records one event for `run`
    ///
    /// # Returns
    /// The event as sent. Whether a failure is fatal is the caller's decision.
    pub async fn record(
        &self,
        run: &mut PipelineRun,
        status: EventStatus,
        details: Map<String, JsonValue>,
    ) -> Result<Event, InvokeError> {
        let timestamp = run.next_timestamp();
        let event = Event::for_run(run, status, timestamp, details);

        self.api.record_event(&event).await?;

        debug!(
            correlation_id = %event.correlation_id,
            status = %event.status,
            "Recorded event"
        );
        Ok(event)
    }
}
