//! Alert sinks: one that logs, one that records for assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Alert, DeliveryError};
use crate::ports::AlertSink;
use crate::COMPONENT;

/// Logs every alert. Used by the headless CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn show(&self, alert: &Alert) {
        tracing::info!(
            component = COMPONENT,
            notification_id = %alert.notification_id,
            priority = ?alert.priority,
            title = %alert.title,
            "Alert shown"
        );
    }

    fn update(&self, alert: &Alert) {
        tracing::info!(
            component = COMPONENT,
            notification_id = %alert.notification_id,
            revision = alert.revision,
            "Alert updated"
        );
    }

    fn dismiss(&self, notification_id: &str) {
        tracing::info!(component = COMPONENT, notification_id, "Alert dismissed");
    }

    fn play_sound(&self, _alert: &Alert) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported("sound"))
    }

    fn vibrate(&self, _alert: &Alert) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported("haptic"))
    }

    fn push(&self, _alert: &Alert) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unsupported("push"))
    }
}

/// One call made on a `RecordingAlertSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertRecord {
    Shown(Alert),
    Updated(Alert),
    Dismissed(String),
    Sound(String),
    Haptic(String),
    Push(String),
}

/// Records calls; clones share the log. Push can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    records: Arc<Mutex<Vec<AlertRecord>>>,
    push_error: Arc<Mutex<Option<DeliveryError>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_push(&self, error: DeliveryError) {
        *self.push_error.lock() = Some(error);
    }

    pub fn records(&self) -> Vec<AlertRecord> {
        self.records.lock().clone()
    }

    pub fn shown_count(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| matches!(r, AlertRecord::Shown(_)))
            .count()
    }

    pub fn count(&self, matcher: impl Fn(&AlertRecord) -> bool) -> usize {
        self.records.lock().iter().filter(|r| matcher(r)).count()
    }
}

impl AlertSink for RecordingAlertSink {
    fn show(&self, alert: &Alert) {
        self.records.lock().push(AlertRecord::Shown(alert.clone()));
    }

    fn update(&self, alert: &Alert) {
        self.records.lock().push(AlertRecord::Updated(alert.clone()));
    }

    fn dismiss(&self, notification_id: &str) {
        self.records
            .lock()
            .push(AlertRecord::Dismissed(notification_id.to_string()));
    }

    fn play_sound(&self, alert: &Alert) -> Result<(), DeliveryError> {
        self.records
            .lock()
            .push(AlertRecord::Sound(alert.notification_id.clone()));
        Ok(())
    }

    fn vibrate(&self, alert: &Alert) -> Result<(), DeliveryError> {
        self.records
            .lock()
            .push(AlertRecord::Haptic(alert.notification_id.clone()));
        Ok(())
    }

    fn push(&self, alert: &Alert) -> Result<(), DeliveryError> {
        if let Some(error) = self.push_error.lock().clone() {
            return Err(error);
        }
        self.records
            .lock()
            .push(AlertRecord::Push(alert.notification_id.clone()));
        Ok(())
    }
}
