//! Collection events for notification collaborators
//!
//! Views publish what happened to their collection on an [`EventBus`]. Toast
//! or alert layers subscribe and decide how to present it; the engine never
//! renders anything itself.
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new(256);
//! let mut rx = bus.subscribe();
//!
//! view.perform(Mutation::Delete { id: "inv-1".into() }).await?;
//!
//! while let Ok(envelope) = rx.try_recv() {
//!     println!("{}: {:?}", envelope.timestamp, envelope.event);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something that happened to a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CollectionEvent {
    /// A fetch completed and replaced the snapshot
    Refreshed {
        resource: String,
        item_count: usize,
        total_count: usize,
    },
    /// A fetch failed; the previous snapshot is kept
    FetchFailed {
        resource: String,
        error_code: String,
        message: String,
    },
    /// A mutation was accepted by the backend
    MutationSucceeded {
        resource: String,
        mutation: String,
        item_id: Option<String>,
    },
    /// A mutation was rejected or never reached the backend
    MutationFailed {
        resource: String,
        mutation: String,
        item_id: Option<String>,
        error_code: String,
        message: String,
    },
}

impl CollectionEvent {
    /// Get the resource this event relates to
    pub fn resource(&self) -> &str {
        match self {
            CollectionEvent::Refreshed { resource, .. }
            | CollectionEvent::FetchFailed { resource, .. }
            | CollectionEvent::MutationSucceeded { resource, .. }
            | CollectionEvent::MutationFailed { resource, .. } => resource,
        }
    }

    /// Whether the event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CollectionEvent::FetchFailed { .. } | CollectionEvent::MutationFailed { .. }
        )
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: CollectionEvent,
}

impl EventEnvelope {
    pub fn new(event: CollectionEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Slow receivers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails; returns the number of receivers reached.
    pub fn publish(&self, event: CollectionEvent) -> usize {
        self.sender.send(EventEnvelope::new(event)).unwrap_or(0)
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
