//! Inbound port: what the runtime and UI call.

use async_trait::async_trait;
use shared_types::NotificationItem;

use crate::domain::{Alert, NotificationPreferences, NotifyOutcome, PermissionState};

/// Notification Dispatcher API - inbound port.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Run `item` through the policy pipeline.
    fn notify(&self, item: &NotificationItem) -> NotifyOutcome;

    /// Remove the alert for `notification_id`. Returns false if none shown.
    fn dismiss(&self, notification_id: &str) -> bool;

    /// Ask the platform for push permission. Never fails; a refusal is just
    /// a `Denied` state.
    async fn request_permission(&self) -> PermissionState;

    fn set_preferences(&self, preferences: NotificationPreferences);

    fn preferences(&self) -> NotificationPreferences;

    /// Currently shown alerts, oldest first.
    fn active_alerts(&self) -> Vec<Alert>;
}
