//! In-process event bus backed by a `tokio::sync::broadcast` channel (PRD-87).
//!
//! [`EventBus`] is the publish/subscribe hub the engine uses to announce
//! version and WIP changes, replacing any transport-specific notification
//! mechanism: UI layers subscribe and filter by project instead of listening
//! for ambient window events. Shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use mxvault_core::types::{DbId, ProjectId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Well-known event type strings published by the engine.
pub mod topics {
    /// A historical version row was created.
    pub const VERSION_CREATED: &str = "version.created";
    /// A historical version row was deleted.
    pub const VERSION_DELETED: &str = "version.deleted";
    /// The work-in-progress row was overwritten.
    pub const WIP_UPDATED: &str = "wip.updated";
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the versioning engine.
///
/// Constructed via [`DomainEvent::new`] and enriched with the builder
/// methods [`with_project`](DomainEvent::with_project),
/// [`with_version`](DomainEvent::with_version), and
/// [`with_payload`](DomainEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"version.created"`.
    pub event_type: String,

    /// Project the event belongs to, when project-scoped.
    pub project_id: Option<ProjectId>,

    /// Version row the event refers to, when version-scoped.
    pub version_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            project_id: None,
            version_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Scope the event to a project.
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Attach the version row the event refers to.
    pub fn with_version(mut self, version_id: DbId) -> Self {
        self.version_id = Some(version_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`DomainEvent`].
///
/// # Usage
///
/// ```rust
/// use mxvault_events::{topics, DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new(topics::VERSION_CREATED));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    ///
    /// Project-scoped observation is a receiver-side filter on
    /// [`DomainEvent::project_id`].
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
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
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let project_id = Uuid::now_v7();
        let event = DomainEvent::new(topics::VERSION_CREATED)
            .with_project(project_id)
            .with_version(42)
            .with_payload(serde_json::json!({"semantic_version": "1.1.0"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, topics::VERSION_CREATED);
        assert_eq!(received.project_id, Some(project_id));
        assert_eq!(received.version_id, Some(42));
        assert_eq!(received.payload["semantic_version"], "1.1.0");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DomainEvent::new(topics::WIP_UPDATED));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, topics::WIP_UPDATED);
        assert_eq!(e2.event_type, topics::WIP_UPDATED);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        // No subscribers — this must not panic.
        bus.publish(DomainEvent::new(topics::VERSION_DELETED));
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = DomainEvent::new("bare.event");
        assert_eq!(event.event_type, "bare.event");
        assert!(event.project_id.is_none());
        assert!(event.version_id.is_none());
        assert!(event.payload.is_object());
    }
}
