//! Event DTOs
//!
//! Query payloads for event retrieval and the decoding of stored entries.

use serde::{Deserialize, Serialize};

use crate::domain::event::Event;

/// Query of `getEvents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsQuery {
    pub dataset: String,
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
}

/// One entry as returned by the event store
///
/// The state store may hand back the event object itself or the JSON text it
/// was saved as.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredEvent {
    Inline(Event),
    Encoded(String),
}

impl StoredEvent {
    /// Decodes the entry into an event
    pub fn into_event(self) -> Result<Event, serde_json::Error> {
        match self {
            StoredEvent::Inline(event) => Ok(event),
            StoredEvent::Encoded(text) => serde_json::from_str(&text),
        }
    }
}

/// Whole answer of `getEvents`
///
/// A key holding one value comes back as that bare entry rather than a
/// one-element list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredEvents {
    Many(Vec<StoredEvent>),
    One(StoredEvent),
}

impl StoredEvents {
    pub fn into_entries(self) -> Vec<StoredEvent> {
        match self {
            StoredEvents::Many(entries) => entries,
            StoredEvents::One(entry) => vec![entry],
        }
    }
}
