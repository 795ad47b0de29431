//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`MappingEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the session manager
//! and whatever renders the sessions.

use chrono::{DateTime, Utc};
use pm33_core::types::IntegrationId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

pub const EVENT_SESSION_OPENED: &str = "session.opened";
pub const EVENT_SESSION_CLOSED: &str = "session.closed";
pub const EVENT_SESSION_SYNCED: &str = "session.synced";
pub const EVENT_MAPPING_TARGET_SET: &str = "mapping.target_set";
pub const EVENT_MAPPING_IGNORED: &str = "mapping.ignored";
pub const EVENT_MAPPING_ANALYZED: &str = "mapping.analyzed";

// ---------------------------------------------------------------------------
// MappingEvent
// ---------------------------------------------------------------------------

/// A change to a mapping session.
///
/// Constructed via [`MappingEvent::new`] and enriched with
/// [`with_field`](MappingEvent::with_field) and
/// [`with_payload`](MappingEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEvent {
    /// Dot-separated event name, e.g. `"mapping.target_set"`.
    pub event_type: String,

    /// Session the event belongs to.
    pub integration_id: IntegrationId,

    /// Source field affected, for single-field events.
    pub source_field: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl MappingEvent {
    pub fn new(event_type: impl Into<String>, integration_id: impl Into<IntegrationId>) -> Self {
        Self {
            event_type: event_type.into(),
            integration_id: integration_id.into(),
            source_field: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_field(mut self, source_field: impl Into<String>) -> Self {
        self.source_field = Some(source_field.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full, the oldest un-consumed events are dropped and
/// slow receivers observe a `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<MappingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Events published with no subscribers are dropped.
    pub fn publish(&self, event: MappingEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::trace!(event_type = %event.event_type, "No subscribers for mapping event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MappingEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = MappingEvent::new(EVENT_MAPPING_TARGET_SET, "jira")
            .with_field("summary")
            .with_payload(serde_json::json!({"target_field": "title"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "mapping.target_set");
        assert_eq!(received.integration_id, "jira");
        assert_eq!(received.source_field.as_deref(), Some("summary"));
        assert_eq!(received.payload["target_field"], "title");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(MappingEvent::new(EVENT_SESSION_OPENED, "linear"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, EVENT_SESSION_OPENED);
        assert_eq!(e2.integration_id, "linear");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(MappingEvent::new(EVENT_SESSION_CLOSED, "monday"));
    }

    #[test]
    fn new_event_has_empty_optional_fields() {
        let event = MappingEvent::new(EVENT_MAPPING_ANALYZED, "jira");
        assert!(event.source_field.is_none());
        assert!(event.payload.is_object());
    }
}
