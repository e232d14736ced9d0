//! Event types for the DramaWave change broadcast
//!
//! Every store mutation is announced on the EventBus so connected clients
//! (SSE) can re-read the affected data.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{ChatMessage, Comment, ContentKind, Notification, Sticker};

type Timestamp = chrono::DateTime<chrono::Utc>;

/// DramaWave event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DramaEvent {
    /// Comment or reply posted
    CommentAdded {
        comment: Comment,
        timestamp: Timestamp,
    },

    /// Moderation cascade removed comments from a content item
    CommentsRemoved {
        content_id: String,
        /// Ids actually deleted, target first
        removed: Vec<String>,
        timestamp: Timestamp,
    },

    /// New catalog entry
    ContentPublished {
        content_id: String,
        kind: ContentKind,
        timestamp: Timestamp,
    },

    /// Catalog entry edited
    ContentUpdated {
        content_id: String,
        timestamp: Timestamp,
    },

    /// Episode added to a series
    EpisodePublished {
        content_id: String,
        episode_number: i64,
        timestamp: Timestamp,
    },

    /// Like toggled
    ContentLikeToggled {
        content_id: String,
        user_id: String,
        liked: bool,
        likes: i64,
        timestamp: Timestamp,
    },

    /// Notification created
    ///
    /// Subscribers recompute their unread count.
    NotificationPublished {
        notification: Notification,
        timestamp: Timestamp,
    },

    /// A user marked notifications as seen
    NotificationsSeen {
        user_id: String,
        notification_ids: Vec<String>,
        timestamp: Timestamp,
    },

    /// Global chat message posted
    ChatMessagePosted {
        message: ChatMessage,
        timestamp: Timestamp,
    },

    /// Profile renamed (names are resolved at read time)
    UserProfileUpdated {
        uid: String,
        display_name: String,
        timestamp: Timestamp,
    },

    /// Admin changed a user's role or suspension
    UserModerated {
        uid: String,
        is_admin: bool,
        suspended_until: Option<i64>,
        timestamp: Timestamp,
    },

    /// Sticker added or removed
    StickersChanged {
        added: Option<Sticker>,
        removed: Option<String>,
        timestamp: Timestamp,
    },

    /// Daily recommendation stored
    RecommendationUpdated {
        date: String,
        timestamp: Timestamp,
    },
}

impl DramaEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            DramaEvent::CommentAdded { .. } => "CommentAdded",
            DramaEvent::CommentsRemoved { .. } => "CommentsRemoved",
            DramaEvent::ContentPublished { .. } => "ContentPublished",
            DramaEvent::ContentUpdated { .. } => "ContentUpdated",
            DramaEvent::EpisodePublished { .. } => "EpisodePublished",
            DramaEvent::ContentLikeToggled { .. } => "ContentLikeToggled",
            DramaEvent::NotificationPublished { .. } => "NotificationPublished",
            DramaEvent::NotificationsSeen { .. } => "NotificationsSeen",
            DramaEvent::ChatMessagePosted { .. } => "ChatMessagePosted",
            DramaEvent::UserProfileUpdated { .. } => "UserProfileUpdated",
            DramaEvent::UserModerated { .. } => "UserModerated",
            DramaEvent::StickersChanged { .. } => "StickersChanged",
            DramaEvent::RecommendationUpdated { .. } => "RecommendationUpdated",
        }
    }

    /// Content item the event concerns, if any
    pub fn content_id(&self) -> Option<&str> {
        match self {
            DramaEvent::CommentAdded { comment, .. } => Some(&comment.content_id),
            DramaEvent::CommentsRemoved { content_id, .. }
            | DramaEvent::ContentPublished { content_id, .. }
            | DramaEvent::ContentUpdated { content_id, .. }
            | DramaEvent::EpisodePublished { content_id, .. }
            | DramaEvent::ContentLikeToggled { content_id, .. } => Some(content_id),
            DramaEvent::NotificationPublished { notification, .. } => {
                Some(&notification.content_id)
            }
            _ => None,
        }
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`:
/// - Every subscriber sees events in emission order
/// - A subscriber that falls more than `capacity` events behind loses the
///   oldest ones (`RecvError::Lagged`) and must re-read state
/// - Cloning shares the same channel
///
/// # Examples
///
/// ```
/// use dramawave_common::events::{DramaEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(DramaEvent::ContentUpdated {
///     content_id: "abc".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert_eq!(rx.try_recv().unwrap().event_type(), "ContentUpdated");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DramaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DramaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DramaEvent,
    ) -> Result<usize, broadcast::error::SendError<DramaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DramaEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn updated(id: &str) -> DramaEvent {
        DramaEvent::ContentUpdated {
            content_id: id.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = DramaEvent::CommentsRemoved {
            content_id: "c1".into(),
            removed: vec!["a".into(), "b".into()],
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CommentsRemoved");
        assert_eq!(json["removed"].as_array().unwrap().len(), 2);
        assert_eq!(event.content_id(), Some("c1"));
    }

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(10);
        assert!(bus.emit(updated("x")).is_err());
        bus.emit_lossy(updated("x"));
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 10);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(updated("1")).unwrap(), 2);
        bus.emit_lossy(updated("2"));

        for rx in [&mut rx1, &mut rx2] {
            assert_eq!(rx.recv().await.unwrap().content_id(), Some("1"));
            assert_eq!(rx.recv().await.unwrap().content_id(), Some("2"));
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_loses_oldest() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.emit_lossy(updated(&i.to_string()));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().content_id(), Some("3"));
    }
}
