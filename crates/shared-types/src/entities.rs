//! # Synchronized Entities
//!
//! The three entity families kept in local stores and the partial deltas that
//! update them.
//!
//! ## Clusters
//!
//! - **Repair tracking**: `RepairProgress`, `RepairStep`
//! - **Notification center**: `NotificationItem`, `Priority`, `NotificationCategory`
//! - **Photo gallery**: `RepairPhoto`, `PhotoAnnotation`
//!
//! Every entity carries a unique `id` and a per-entity monotonic `updated_at`.
//! A delta is only ever merged when it is strictly newer than what is stored.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::delta::{merge_list, ListItem, ListPatch};
use crate::Timestamp;

/// Entity identifier, unique within its kind.
pub type EntityId = String;

/// The entity families the client synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Repair status tracker entries.
    RepairProgress,
    /// Notification center items.
    Notification,
    /// Repair photo gallery entries.
    Photo,
}

impl EntityKind {
    /// All kinds, in store order.
    pub const ALL: [EntityKind; 3] = [Self::RepairProgress, Self::Notification, Self::Photo];

    /// Stable lowercase name, used in logs and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RepairProgress => "repair_progress",
            Self::Notification => "notification",
            Self::Photo => "photo",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial, timestamped update to an entity.
pub trait Delta: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Id of the entity this delta targets.
    fn id(&self) -> &str;

    /// Timestamp of the change on the authoritative side.
    fn updated_at(&self) -> Timestamp;
}

/// An entity held in a local store.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Delta type that updates this entity.
    type Delta: Delta;

    /// Kind tag of this entity family.
    const KIND: EntityKind;

    /// Unique id.
    fn id(&self) -> &str;

    /// Timestamp of the last merged change.
    fn updated_at(&self) -> Timestamp;

    /// Build the entity from the first delta seen for its id.
    fn from_delta(delta: Self::Delta) -> Self;

    /// Shallow-merge every field present in `delta` and adopt its `updated_at`.
    ///
    /// Callers are responsible for the ordering check.
    fn merge(&mut self, delta: Self::Delta);
}

/// Entities that may be removed automatically once they expire.
pub trait Expirable {
    /// Expiry instant, if the entity is time-boxed.
    fn expires_at(&self) -> Option<Timestamp>;

    /// Persistent entities never expire.
    fn is_persistent(&self) -> bool;

    /// True when the entity is time-boxed, not persistent, and past its expiry.
    fn is_expired(&self, now: Timestamp) -> bool {
        !self.is_persistent() && self.expires_at().is_some_and(|at| at <= now)
    }
}

// =============================================================================
// CLUSTER A: REPAIR TRACKING
// =============================================================================

/// Workflow position of a repair ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    /// Device checked in.
    #[default]
    Received,
    /// Technician is diagnosing the fault.
    Diagnosing,
    /// Waiting on parts.
    AwaitingParts,
    /// Repair work underway.
    InRepair,
    /// Final checks.
    QualityCheck,
    /// Customer can collect the device.
    ReadyForPickup,
    /// Handed back to the customer.
    Completed,
    /// Ticket cancelled.
    Cancelled,
}

impl RepairStatus {
    /// Terminal states receive no further workflow updates.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// One step on a repair checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairStep {
    /// Sub-id, unique within the repair.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Whether the step is done.
    #[serde(default)]
    pub completed: bool,
    /// When the step was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl ListItem for RepairStep {
    fn item_id(&self) -> &str {
        &self.id
    }
}

/// Reconciled state of a repair ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairProgress {
    pub id: EntityId,
    pub updated_at: Timestamp,
    pub status: RepairStatus,
    /// Completion percentage, 0-100.
    pub progress_percent: u8,
    pub technician: Option<String>,
    pub estimated_completion: Option<Timestamp>,
    pub steps: Vec<RepairStep>,
    pub notes: Option<String>,
}

/// Partial update to a `RepairProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairProgressDelta {
    pub id: EntityId,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RepairStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<ListPatch<RepairStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RepairProgressDelta {
    /// Empty delta carrying only identity and timestamp.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, updated_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at,
            status: None,
            progress_percent: None,
            technician: None,
            estimated_completion: None,
            steps: None,
            notes: None,
        }
    }
}

impl Delta for RepairProgressDelta {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

impl Entity for RepairProgress {
    type Delta = RepairProgressDelta;
    const KIND: EntityKind = EntityKind::RepairProgress;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn from_delta(delta: Self::Delta) -> Self {
        let mut progress = Self {
            id: delta.id.clone(),
            updated_at: delta.updated_at,
            status: RepairStatus::default(),
            progress_percent: 0,
            technician: None,
            estimated_completion: None,
            steps: Vec::new(),
            notes: None,
        };
        progress.merge(delta);
        progress
    }

    fn merge(&mut self, delta: Self::Delta) {
        if let Some(status) = delta.status {
            self.status = status;
        }
        if let Some(percent) = delta.progress_percent {
            self.progress_percent = percent.min(100);
        }
        if delta.technician.is_some() {
            self.technician = delta.technician;
        }
        if delta.estimated_completion.is_some() {
            self.estimated_completion = delta.estimated_completion;
        }
        if let Some(patch) = delta.steps {
            merge_list(&mut self.steps, patch);
        }
        if delta.notes.is_some() {
            self.notes = delta.notes;
        }
        self.updated_at = delta.updated_at;
    }
}

// =============================================================================
// CLUSTER B: NOTIFICATION CENTER
// =============================================================================

/// Delivery urgency. Ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    /// Bypasses quiet hours.
    Urgent,
}

/// User-facing notification category, used by the preference gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    RepairUpdate,
    Payment,
    Pickup,
    Promotion,
    System,
    /// Any category this client does not know yet.
    #[default]
    #[serde(other)]
    Other,
}

/// Reconciled state of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: EntityId,
    pub updated_at: Timestamp,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub priority: Priority,
    pub read: bool,
    pub expires_at: Option<Timestamp>,
    /// Exempt from automatic expiration.
    pub persistent: bool,
    /// Repair this notification refers to, if any.
    pub repair_id: Option<String>,
}

impl NotificationItem {
    /// Convenience constructor used by tests and local producers.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, updated_at: Timestamp, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            updated_at,
            title: title.into(),
            body: String::new(),
            category: NotificationCategory::default(),
            priority: Priority::default(),
            read: false,
            expires_at: None,
            persistent: false,
            repair_id: None,
        }
    }
}

impl Expirable for NotificationItem {
    fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }
}

/// Partial update to a `NotificationItem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDelta {
    pub id: EntityId,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_id: Option<String>,
}

impl NotificationDelta {
    /// Empty delta carrying only identity and timestamp.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, updated_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at,
            title: None,
            body: None,
            category: None,
            priority: None,
            read: None,
            expires_at: None,
            persistent: None,
            repair_id: None,
        }
    }
}

impl Delta for NotificationDelta {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

impl Entity for NotificationItem {
    type Delta = NotificationDelta;
    const KIND: EntityKind = EntityKind::Notification;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn from_delta(delta: Self::Delta) -> Self {
        let mut item = Self::new(delta.id.clone(), delta.updated_at, String::new());
        item.merge(delta);
        item
    }

    fn merge(&mut self, delta: Self::Delta) {
        if let Some(title) = delta.title {
            self.title = title;
        }
        if let Some(body) = delta.body {
            self.body = body;
        }
        if let Some(category) = delta.category {
            self.category = category;
        }
        if let Some(priority) = delta.priority {
            self.priority = priority;
        }
        if let Some(read) = delta.read {
            self.read = read;
        }
        if delta.expires_at.is_some() {
            self.expires_at = delta.expires_at;
        }
        if let Some(persistent) = delta.persistent {
            self.persistent = persistent;
        }
        if delta.repair_id.is_some() {
            self.repair_id = delta.repair_id;
        }
        self.updated_at = delta.updated_at;
    }
}

// =============================================================================
// CLUSTER C: PHOTO GALLERY
// =============================================================================

/// When in the repair a photo was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoStage {
    Before,
    #[default]
    During,
    After,
}

/// A marker placed on a photo by a technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAnnotation {
    pub id: String,
    /// Horizontal position, 0.0-1.0 of the image width.
    pub x: f32,
    /// Vertical position, 0.0-1.0 of the image height.
    pub y: f32,
    pub text: String,
}

impl ListItem for PhotoAnnotation {
    fn item_id(&self) -> &str {
        &self.id
    }
}

/// Reconciled state of a repair photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairPhoto {
    pub id: EntityId,
    pub updated_at: Timestamp,
    pub repair_id: String,
    pub url: String,
    pub caption: Option<String>,
    pub stage: PhotoStage,
    pub annotations: Vec<PhotoAnnotation>,
}

/// Partial update to a `RepairPhoto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairPhotoDelta {
    pub id: EntityId,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<PhotoStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ListPatch<PhotoAnnotation>>,
}

impl RepairPhotoDelta {
    /// Empty delta carrying only identity and timestamp.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, updated_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at,
            repair_id: None,
            url: None,
            caption: None,
            stage: None,
            annotations: None,
        }
    }
}

impl Delta for RepairPhotoDelta {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

impl Entity for RepairPhoto {
    type Delta = RepairPhotoDelta;
    const KIND: EntityKind = EntityKind::Photo;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn from_delta(delta: Self::Delta) -> Self {
        let mut photo = Self {
            id: delta.id.clone(),
            updated_at: delta.updated_at,
            repair_id: String::new(),
            url: String::new(),
            caption: None,
            stage: PhotoStage::default(),
            annotations: Vec::new(),
        };
        photo.merge(delta);
        photo
    }

    fn merge(&mut self, delta: Self::Delta) {
        if let Some(repair_id) = delta.repair_id {
            self.repair_id = repair_id;
        }
        if let Some(url) = delta.url {
            self.url = url;
        }
        if delta.caption.is_some() {
            self.caption = delta.caption;
        }
        if let Some(stage) = delta.stage {
            self.stage = stage;
        }
        if let Some(patch) = delta.annotations {
            merge_list(&mut self.annotations, patch);
        }
        self.updated_at = delta.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_notification_delta_parses_partial_payload() {
        let delta: NotificationDelta = serde_json::from_str(
            r#"{"id":"n1","updated_at":"2024-05-01T10:00:00Z","read":true}"#,
        )
        .unwrap();
        assert_eq!(delta.read, Some(true));
        assert!(delta.title.is_none());
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let delta: NotificationDelta = serde_json::from_str(
            r#"{"id":"n1","updated_at":"2024-05-01T10:00:00Z","category":"loyalty_points"}"#,
        )
        .unwrap();
        assert_eq!(delta.category, Some(NotificationCategory::Other));
    }

    #[test]
    fn test_repair_merge_keeps_absent_fields() {
        let mut first = RepairProgressDelta::new("r1", ts(0));
        first.status = Some(RepairStatus::Diagnosing);
        first.technician = Some("Ana".to_string());
        let mut repair = RepairProgress::from_delta(first);

        let mut second = RepairProgressDelta::new("r1", ts(10));
        second.progress_percent = Some(150);
        repair.merge(second);

        assert_eq!(repair.status, RepairStatus::Diagnosing);
        assert_eq!(repair.technician.as_deref(), Some("Ana"));
        assert_eq!(repair.progress_percent, 100);
        assert_eq!(repair.updated_at, ts(10));
    }

    #[test]
    fn test_photo_annotations_append() {
        let mut first = RepairPhotoDelta::new("p1", ts(0));
        first.annotations = Some(ListPatch::append(vec![PhotoAnnotation {
            id: "a1".to_string(),
            x: 0.1,
            y: 0.2,
            text: "crack".to_string(),
        }]));
        let mut photo = RepairPhoto::from_delta(first);

        let mut second = RepairPhotoDelta::new("p1", ts(5));
        second.annotations = Some(ListPatch::append(vec![PhotoAnnotation {
            id: "a2".to_string(),
            x: 0.5,
            y: 0.5,
            text: "dent".to_string(),
        }]));
        photo.merge(second);

        assert_eq!(photo.annotations.len(), 2);
    }

    #[test]
    fn test_expiration_rules() {
        let mut item = NotificationItem::new("n1", ts(0), "Ready");
        assert!(!item.is_expired(ts(100)));

        item.expires_at = Some(ts(50));
        assert!(item.is_expired(ts(100)));
        assert!(!item.is_expired(ts(10)));

        item.persistent = true;
        assert!(!item.is_expired(ts(100) + Duration::days(365)));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Low < Priority::Normal);
    }
}
