//! Queue change events and the broadcast bus feeding UI subscribers.
//!
//! Every mutation of the local photo store (create, metadata update,
//! delete, status transition) emits a [`QueueEvent`] on a single shared
//! [`QueueEventBus`]. All consuming views subscribe to the same bus, so
//! multiple surfaces observing the queue never diverge and nothing polls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{BatchSummary, SyncStatus};

/// A change to the photo queue, serialized with a `type` tag, e.g.
/// `{"type":"PhotoQueued","local_id":"...","project_id":"..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// A new photo entered the queue with status `pending`.
    PhotoQueued { local_id: Uuid, project_id: Uuid },
    /// Caption/category/association metadata changed.
    PhotoUpdated { local_id: Uuid },
    /// A photo was removed from the queue by user action or purge.
    PhotoDeleted { local_id: Uuid },
    /// The sync state machine moved an item to a new status.
    StatusChanged {
        local_id: Uuid,
        status: SyncStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
    },
    /// A batch drain started over a snapshot of `total` items.
    BatchStarted { total: u32 },
    /// A batch drain finished with the given summary.
    BatchFinished { summary: BatchSummary },
}

/// A [`QueueEvent`] stamped with an identifier and emission time.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// When the event was emitted (UTC).
    pub occurred_at: DateTime<Utc>,
    /// The change itself.
    pub payload: QueueEvent,
}

impl QueueEventEnvelope {
    fn new(payload: QueueEvent) -> Self {
        Self {
            event_id: crate::uuid_utils::new_v7(),
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// Broadcast bus carrying queue change notifications.
///
/// Cheap to clone; all clones share the same channel. Subscribers that
/// fall behind the buffer capacity observe a `Lagged` error and should
/// refresh from the store rather than replaying events.
#[derive(Debug, Clone)]
pub struct QueueEventBus {
    tx: broadcast::Sender<QueueEventEnvelope>,
}

impl QueueEventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the store remains the source of truth.
    pub fn emit(&self, event: QueueEvent) {
        let envelope = QueueEventEnvelope::new(event);
        tracing::debug!(
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            payload = ?envelope.payload,
            "Queue event emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to queue changes. Each subscriber gets an independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for QueueEventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_subscribe() {
        let bus = QueueEventBus::new(32);
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        bus.emit(QueueEvent::PhotoUpdated { local_id: id });

        let envelope = rx.recv().await.unwrap();
        match envelope.payload {
            QueueEvent::PhotoUpdated { local_id } => assert_eq!(local_id, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_dropped() {
        let bus = QueueEventBus::new(8);
        // No receiver; must not panic or block.
        bus.emit(QueueEvent::PhotoDeleted {
            local_id: Uuid::new_v4(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_every_event() {
        let bus = QueueEventBus::new(32);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(QueueEvent::BatchStarted { total: 3 });

        for rx in [&mut rx1, &mut rx2] {
            let envelope = rx.recv().await.unwrap();
            assert!(matches!(
                envelope.payload,
                QueueEvent::BatchStarted { total: 3 }
            ));
        }
    }

    #[tokio::test]
    async fn test_envelope_ids_are_time_ordered() {
        let bus = QueueEventBus::new(32);
        let mut rx = bus.subscribe();

        bus.emit(QueueEvent::BatchStarted { total: 1 });
        bus.emit(QueueEvent::BatchFinished {
            summary: BatchSummary {
                successful: 1,
                failed: 0,
            },
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.event_id <= second.event_id);
    }

    #[test]
    fn test_status_changed_serialization() {
        let event = QueueEvent::StatusChanged {
            local_id: Uuid::nil(),
            status: SyncStatus::Failed,
            error_message: Some("remote rejected".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"StatusChanged\""));
        assert!(json.contains("\"failed\""));
        assert!(json.contains("remote rejected"));
    }
}
