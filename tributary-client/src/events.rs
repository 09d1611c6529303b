//! Correlation ids and lifecycle events

use serde_json::Value as JsonValue;
use tributary_core::domain::event::Event;
use tributary_core::domain::run::CorrelationId;
use tributary_core::dto::correlation::CorrelationIdResponse;
use tributary_core::dto::event::{EventsQuery, StoredEvents};

use crate::error::{InvokeError, Result};
use crate::{NodeApi, Verb, decode, methods, require_present, to_payload};

impl NodeApi {
    // =============================================================================
    // Correlation
    // =============================================================================

    /// Obtain a fresh correlation id from the node service
    ///
    /// # Returns
    /// A non-empty id unique across every coordinator using the same service
    pub async fn generate_correlation_id(&self) -> Result<CorrelationId> {
        let value = self
            .call(methods::GENERATE_CORRELATION_ID, Verb::Get, None)
            .await?;
        let response: CorrelationIdResponse = decode(methods::GENERATE_CORRELATION_ID, value)?;

        let token = response.correlation_id.trim();
        if token.is_empty() {
            return Err(InvokeError::data(
                methods::GENERATE_CORRELATION_ID,
                "empty correlation id",
            ));
        }
        Ok(CorrelationId::new(token))
    }

    // =============================================================================
    // Events
    // =============================================================================

    /// Record a lifecycle event
    ///
    /// # Returns
    /// The service acknowledgement (never null)
    pub async fn record_event(&self, event: &Event) -> Result<JsonValue> {
        let payload = to_payload(methods::RECORD_EVENT, event)?;
        let value = self
            .call(methods::RECORD_EVENT, Verb::Post, Some(payload))
            .await?;
        require_present(methods::RECORD_EVENT, value)
    }

    /// Fetch the events recorded for a dataset and correlation id
    ///
    /// # Returns
    /// The events in store order. An empty or null answer means nothing was
    /// recorded and yields an empty list; a single bare entry yields one event.
    pub async fn get_events(
        &self,
        dataset: &str,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<Event>> {
        let payload = to_payload(
            methods::GET_EVENTS,
            &EventsQuery {
                dataset: dataset.to_string(),
                correlation_id: correlation_id.to_string(),
            },
        )?;
        let value = self
            .call(methods::GET_EVENTS, Verb::Get, Some(payload))
            .await?;

        if value.is_null() {
            return Ok(Vec::new());
        }

        let entries: StoredEvents = decode(methods::GET_EVENTS, value)?;
        entries
            .into_entries()
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry.into_event().map_err(|e| {
                    InvokeError::data(
                        methods::GET_EVENTS,
                        format!("entry {} is not an event: {}", idx, e),
                    )
                })
            })
            .collect()
    }
}
