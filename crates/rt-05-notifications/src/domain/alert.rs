//! Alerts and the outcome of `notify`.

use serde::{Deserialize, Serialize};
use shared_types::{EntityId, NotificationCategory, NotificationItem, Priority, Timestamp};

/// An in-app alert currently visible to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub notification_id: EntityId,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub priority: Priority,
    pub repair_id: Option<String>,
    pub shown_at: Timestamp,
    /// `updated_at` of the notification content currently displayed.
    pub updated_at: Timestamp,
    /// Number of in-place updates since first shown.
    pub revision: u32,
}

impl Alert {
    pub fn from_item(item: &NotificationItem, now: Timestamp) -> Self {
        Self {
            notification_id: item.id.clone(),
            title: item.title.clone(),
            body: item.body.clone(),
            category: item.category,
            priority: item.priority,
            repair_id: item.repair_id.clone(),
            shown_at: now,
            updated_at: item.updated_at,
            revision: 0,
        }
    }

    /// Replace the displayed content with `item`'s latest content.
    pub fn refresh(&mut self, item: &NotificationItem) {
        self.title = item.title.clone();
        self.body = item.body.clone();
        self.category = item.category;
        self.priority = item.priority;
        self.repair_id = item.repair_id.clone();
        self.updated_at = item.updated_at;
        self.revision += 1;
    }
}

/// Which channels an alert used besides in-app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryChannels {
    pub sound: bool,
    pub haptic: bool,
    pub push: bool,
    /// Intrusive channels were withheld by quiet hours.
    pub quiet: bool,
    /// Intrusive channels were withheld by the rate limiter.
    pub rate_limited: bool,
    /// Push was wanted but permission was missing.
    pub push_degraded: bool,
}

impl DeliveryChannels {
    pub fn in_app_only() -> Self {
        Self::default()
    }

    pub fn is_intrusive(&self) -> bool {
        self.sound || self.haptic || self.push
    }

    /// Drop sound, haptic and push, keeping the bookkeeping flags.
    pub fn strip_intrusive(&mut self) {
        self.sound = false;
        self.haptic = false;
        self.push = false;
    }
}

/// Why a notification raised no alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    CategoryDisabled,
    AlreadyRead,
    Expired,
}

/// What `notify` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// A new alert was shown.
    Shown(DeliveryChannels),
    /// An unread alert with the same id was updated in place.
    Updated,
    /// The item is now read; its alert was removed.
    Dismissed,
    Suppressed(SuppressReason),
}
