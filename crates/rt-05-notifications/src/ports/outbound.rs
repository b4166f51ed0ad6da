//! Outbound ports: the platform the dispatcher delivers through.

use async_trait::async_trait;
use shared_types::Timestamp;

use crate::domain::{Alert, DeliveryError, PermissionState};

/// Presentation and device channels.
///
/// In-app operations cannot fail. Intrusive channels may, and every failure
/// is downgraded to in-app only by the dispatcher.
pub trait AlertSink: Send + Sync {
    fn show(&self, alert: &Alert);

    fn update(&self, alert: &Alert);

    fn dismiss(&self, notification_id: &str);

    fn play_sound(&self, alert: &Alert) -> Result<(), DeliveryError>;

    fn vibrate(&self, alert: &Alert) -> Result<(), DeliveryError>;

    fn push(&self, alert: &Alert) -> Result<(), DeliveryError>;
}

/// Native push permission prompt.
#[async_trait]
pub trait PermissionRequester: Send + Sync {
    /// Current permission without prompting.
    fn current(&self) -> PermissionState;

    /// Prompt the user if needed.
    async fn request(&self) -> PermissionState;
}

/// Wall clock, injectable for quiet-hours and rate-limit tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
