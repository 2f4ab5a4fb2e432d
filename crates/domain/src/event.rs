//! Event — the envelope every message on the bus travels in.

use serde::{Deserialize, Serialize};

/// A single message on the event bus.
///
/// The envelope is deliberately untyped: `event_type` names the concrete
/// event and `payload` carries its JSON form, so the bus can route events it
/// does not understand. The factories in [`crate::item::events`] and
/// [`crate::thing::events`] translate between envelopes and typed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Hierarchical address, e.g. `hearth/items/kitchen/state`.
    pub topic: String,
    /// Discriminator naming the concrete event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// JSON payload of the concrete event.
    pub payload: String,
    /// Component that emitted the event, when it chose to identify itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        event_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            event_type: event_type.into(),
            payload: payload.into(),
            source: None,
        }
    }

    /// Attach the emitting component's name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
