//! Lineage query facade
//!
//! Read-only access to what a run left behind. Every call is a fresh remote
//! query; nothing is cached.

use tributary_client::{InvokeError, NodeApi};
use tributary_core::domain::event::Event;
use tributary_core::domain::run::CorrelationId;
use tributary_core::dto::lineage::LineageInfo;

/// Queries recorded events and lineage
#[derive(Clone)]
pub struct LineageQuery {
    api: NodeApi,
}

impl LineageQuery {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Events recorded for `dataset` under `correlation_id`
    ///
    /// # Returns
    /// The events in non-decreasing timestamp order; events with equal
    /// timestamps keep the store's order. An empty list means no recorded
    /// activity, a transport failure is an error.
    pub async fn events_for(
        &self,
        dataset: &str,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<Event>, InvokeError> {
        let mut events = self.api.get_events(dataset, correlation_id).await?;
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }

    /// Lineage known for a dataset or storage location
    pub async fn lineage_for(&self, dataset: &str) -> Result<LineageInfo, InvokeError> {
        self.api.get_lineage(dataset).await
    }
}
