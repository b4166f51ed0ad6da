//! # Sync Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{ChangeOp, EntityChange, EntityId, EntityKind, StateChange};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncEvent {
    // =========================================================================
    // STATE RECONCILER
    // =========================================================================
    /// An entity in a local store was inserted, merged, removed or rolled back.
    EntityChanged(EntityChange),

    // =========================================================================
    // CONNECTION MANAGER
    // =========================================================================
    /// The connection moved to a new state.
    ConnectionStateChanged(StateChange),

    // =========================================================================
    // NOTIFICATION DISPATCHER
    // =========================================================================
    /// A user-visible alert was raised, updated or dismissed.
    Alert(AlertEvent),

    // =========================================================================
    // EXPIRATION SWEEPER
    // =========================================================================
    /// A sweep removed expired entities.
    EntitiesExpired {
        /// Kind of the swept store.
        kind: EntityKind,
        /// Ids removed in this sweep.
        ids: Vec<EntityId>,
    },
}

/// Alert lifecycle events for UI badges and toasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertEvent {
    /// A new in-app alert was shown.
    Shown {
        notification_id: EntityId,
        /// Whether sound, haptic or push fired in addition to in-app.
        intrusive: bool,
    },
    /// An unread alert was updated in place.
    Updated { notification_id: EntityId },
    /// An alert was dismissed, read, or expired.
    Dismissed { notification_id: EntityId },
    /// Suppressed by the category gate.
    Suppressed { notification_id: EntityId },
}

impl AlertEvent {
    #[must_use]
    pub fn notification_id(&self) -> &str {
        match self {
            Self::Shown {
                notification_id, ..
            }
            | Self::Updated { notification_id }
            | Self::Dismissed { notification_id }
            | Self::Suppressed { notification_id } => notification_id,
        }
    }
}

impl SyncEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::EntityChanged(change) => EventTopic::from(change.kind),
            Self::EntitiesExpired { kind, .. } => EventTopic::from(*kind),
            Self::ConnectionStateChanged(_) => EventTopic::Connection,
            Self::Alert(_) => EventTopic::Alerts,
        }
    }

    /// Entity ids this event refers to.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<&str> {
        match self {
            Self::EntityChanged(change) => vec![change.id.as_str()],
            Self::EntitiesExpired { ids, .. } => ids.iter().map(String::as_str).collect(),
            Self::Alert(alert) => vec![alert.notification_id()],
            Self::ConnectionStateChanged(_) => Vec::new(),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntityChanged(change) => match change.op {
                ChangeOp::Inserted => "entity_inserted",
                ChangeOp::Updated => "entity_updated",
                ChangeOp::Removed => "entity_removed",
                ChangeOp::RolledBack => "entity_rolled_back",
            },
            Self::ConnectionStateChanged(_) => "connection_state_changed",
            Self::Alert(_) => "alert",
            Self::EntitiesExpired { .. } => "entities_expired",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Repair progress store changes.
    RepairProgress,
    /// Notification store changes.
    Notifications,
    /// Photo store changes.
    Photos,
    /// Connectivity transitions.
    Connection,
    /// Alert lifecycle.
    Alerts,
    /// All events (no filtering).
    All,
}

impl From<EntityKind> for EventTopic {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::RepairProgress => Self::RepairProgress,
            EntityKind::Notification => Self::Notifications,
            EntityKind::Photo => Self::Photos,
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Entity ids to include. Empty means all ids.
    pub entity_ids: Vec<EntityId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            entity_ids: Vec::new(),
        }
    }

    /// Create a filter for changes of one entity kind.
    #[must_use]
    pub fn kind(kind: EntityKind) -> Self {
        Self::topics(vec![EventTopic::from(kind)])
    }

    /// Narrow the filter to a single entity id.
    #[must_use]
    pub fn with_entity(mut self, id: impl Into<EntityId>) -> Self {
        self.entity_ids.push(id.into());
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SyncEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let id_match = self.entity_ids.is_empty()
            || event
                .entity_ids()
                .iter()
                .any(|id| self.entity_ids.iter().any(|wanted| wanted == id));

        topic_match && id_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::ConnectionState;

    fn repair_change(id: &str) -> SyncEvent {
        SyncEvent::EntityChanged(EntityChange::new(
            EntityKind::RepairProgress,
            id,
            ChangeOp::Updated,
        ))
    }

    fn connection_event() -> SyncEvent {
        SyncEvent::ConnectionStateChanged(StateChange {
            from: ConnectionState::Connecting,
            to: ConnectionState::Connected,
            attempt: 0,
            gave_up: false,
            reason: None,
            at: Utc::now(),
        })
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(repair_change("42").topic(), EventTopic::RepairProgress);
        assert_eq!(connection_event().topic(), EventTopic::Connection);
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&repair_change("42")));
        assert!(filter.matches(&connection_event()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::kind(EntityKind::RepairProgress);
        assert!(filter.matches(&repair_change("42")));
        assert!(!filter.matches(&connection_event()));
    }

    #[test]
    fn test_filter_by_entity() {
        let filter = EventFilter::kind(EntityKind::RepairProgress).with_entity("42");
        assert!(filter.matches(&repair_change("42")));
        assert!(!filter.matches(&repair_change("43")));
    }

    #[test]
    fn test_expired_event_matches_any_listed_id() {
        let event = SyncEvent::EntitiesExpired {
            kind: EntityKind::Notification,
            ids: vec!["n1".into(), "n2".into()],
        };
        let filter = EventFilter::kind(EntityKind::Notification).with_entity("n2");
        assert!(filter.matches(&event));
        assert_eq!(event.name(), "entities_expired");
    }
}
