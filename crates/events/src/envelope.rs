use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published event.
///
/// This is the unit handed to the event bus. restoq persists state first and
/// publishes notifications second, so the envelope carries routing metadata
/// only: a `stream` key grouping related events (an item code, an order id)
/// and the stable `event_type` string, with the payload kept domain-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    /// Key of the stream this event belongs to (e.g. an item code).
    stream: String,

    /// Stable event name, duplicated out of the payload for cheap routing.
    event_type: String,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        stream: impl Into<String>,
        event_type: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            stream: stream.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
