//! # Notification Dispatcher
//!
//! Holds the active alerts, preferences and rate limiter, and drives the
//! platform ports according to the policy decision.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{EntityId, NotificationItem, Priority};
use sync_telemetry::NOTIFICATIONS;

use crate::config::DispatcherConfig;
use crate::domain::{
    evaluate, Alert, AlertRateLimiter, Decision, DeliveryChannels, DeliveryError,
    NotificationPreferences, NotifyOutcome, PermissionState, PlatformCapabilities, PolicyContext,
};
use crate::metrics::{DispatcherDiagnostics, DispatcherDiagnosticsSnapshot};
use crate::ports::{AlertSink, Clock, NotificationApi, PermissionRequester};
use crate::COMPONENT;

struct DispatcherState {
    preferences: NotificationPreferences,
    capabilities: PlatformCapabilities,
    /// Shown alerts, oldest first.
    active: Vec<Alert>,
    limiter: AlertRateLimiter,
}

pub struct NotificationDispatcher {
    config: DispatcherConfig,
    sink: Arc<dyn AlertSink>,
    permissions: Arc<dyn PermissionRequester>,
    clock: Arc<dyn Clock>,
    state: Mutex<DispatcherState>,
    diagnostics: DispatcherDiagnostics,
}

impl NotificationDispatcher {
    pub fn new(
        config: DispatcherConfig,
        sink: Arc<dyn AlertSink>,
        permissions: Arc<dyn PermissionRequester>,
        clock: Arc<dyn Clock>,
        capabilities: PlatformCapabilities,
    ) -> Self {
        let limiter = AlertRateLimiter::new(config.intrusive_burst, config.intrusive_per_minute);
        Self {
            config,
            sink,
            permissions,
            clock,
            state: Mutex::new(DispatcherState {
                preferences: NotificationPreferences::default(),
                capabilities,
                active: Vec::new(),
                limiter,
            }),
            diagnostics: DispatcherDiagnostics::new(),
        }
    }

    pub fn set_capabilities(&self, capabilities: PlatformCapabilities) {
        self.state.lock().capabilities = capabilities;
    }

    pub fn permission(&self) -> PermissionState {
        self.permissions.current()
    }

    /// Dismiss the alerts of notifications removed from the store (expired or
    /// deleted). Returns how many alerts were dismissed.
    pub fn dismiss_all(&self, ids: &[EntityId]) -> usize {
        ids.iter().filter(|id| self.dismiss(id)).count()
    }

    pub fn diagnostics(&self) -> DispatcherDiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    fn deliver(&self, alert: &Alert, mut channels: DeliveryChannels) -> DeliveryChannels {
        if channels.sound {
            match self.sink.play_sound(alert) {
                Ok(()) => DispatcherDiagnostics::incr(&self.diagnostics.sounds),
                Err(error) => {
                    channels.sound = false;
                    self.degraded(alert, "sound", &error);
                }
            }
        }
        if channels.haptic {
            match self.sink.vibrate(alert) {
                Ok(()) => DispatcherDiagnostics::incr(&self.diagnostics.haptics),
                Err(error) => {
                    channels.haptic = false;
                    self.degraded(alert, "haptic", &error);
                }
            }
        }
        if channels.push {
            match self.sink.push(alert) {
                Ok(()) => DispatcherDiagnostics::incr(&self.diagnostics.pushes),
                Err(error) => {
                    channels.push = false;
                    channels.push_degraded = true;
                    self.degraded(alert, "push", &error);
                }
            }
        } else if channels.push_degraded {
            self.degraded(alert, "push", &DeliveryError::PermissionDenied);
        }
        channels
    }

    fn degraded(&self, alert: &Alert, channel: &'static str, error: &DeliveryError) {
        DispatcherDiagnostics::incr(&self.diagnostics.degraded);
        NOTIFICATIONS.with_label_values(&["degraded"]).inc();
        tracing::debug!(
            component = COMPONENT,
            notification_id = %alert.notification_id,
            channel,
            error = %error,
            "Delivery channel downgraded to in-app"
        );
    }

    fn record(&self, outcome: &NotifyOutcome) {
        let label = match outcome {
            NotifyOutcome::Shown(_) => {
                DispatcherDiagnostics::incr(&self.diagnostics.shown);
                "shown"
            }
            NotifyOutcome::Updated => {
                DispatcherDiagnostics::incr(&self.diagnostics.updated);
                "updated"
            }
            NotifyOutcome::Dismissed => "dismissed",
            NotifyOutcome::Suppressed(_) => {
                DispatcherDiagnostics::incr(&self.diagnostics.suppressed);
                "suppressed"
            }
        };
        NOTIFICATIONS.with_label_values(&[label]).inc();
    }
}

#[async_trait]
impl NotificationApi for NotificationDispatcher {
    fn notify(&self, item: &NotificationItem) -> NotifyOutcome {
        let now = self.clock.now();
        let permission = self.permissions.current();
        let mut state = self.state.lock();

        let shown_at = state
            .active
            .iter()
            .position(|alert| alert.notification_id == item.id);
        let decision = evaluate(
            item,
            &PolicyContext {
                preferences: &state.preferences,
                capabilities: state.capabilities,
                permission,
                now,
                already_shown: shown_at.is_some(),
            },
        );

        let outcome = match (decision, shown_at) {
            (Decision::Suppress(_), Some(index)) => {
                let alert = state.active.remove(index);
                self.sink.dismiss(&alert.notification_id);
                DispatcherDiagnostics::incr(&self.diagnostics.dismissed);
                NotifyOutcome::Dismissed
            }
            (Decision::Suppress(reason), None) => {
                tracing::debug!(
                    component = COMPONENT,
                    notification_id = %item.id,
                    reason = ?reason,
                    "Notification suppressed"
                );
                NotifyOutcome::Suppressed(reason)
            }
            (Decision::Update, Some(index)) => {
                let alert = &mut state.active[index];
                if item.updated_at >= alert.updated_at {
                    alert.refresh(item);
                    self.sink.update(alert);
                }
                NotifyOutcome::Updated
            }
            (Decision::Update, None) | (Decision::Show(_), Some(_)) => {
                // evaluate() only returns Update when an alert is shown and
                // never returns Show for one.
                NotifyOutcome::Updated
            }
            (Decision::Show(mut channels), None) => {
                if channels.quiet {
                    DispatcherDiagnostics::incr(&self.diagnostics.quiet_hours);
                }
                if channels.is_intrusive()
                    && item.priority != Priority::Urgent
                    && !state.limiter.try_acquire(now)
                {
                    channels.strip_intrusive();
                    channels.rate_limited = true;
                    DispatcherDiagnostics::incr(&self.diagnostics.rate_limited);
                }

                if state.active.len() >= self.config.max_active_alerts.max(1) {
                    let oldest = state.active.remove(0);
                    self.sink.dismiss(&oldest.notification_id);
                    DispatcherDiagnostics::incr(&self.diagnostics.dismissed);
                }

                let alert = Alert::from_item(item, now);
                self.sink.show(&alert);
                let channels = self.deliver(&alert, channels);
                tracing::debug!(
                    component = COMPONENT,
                    notification_id = %item.id,
                    sound = channels.sound,
                    haptic = channels.haptic,
                    push = channels.push,
                    quiet = channels.quiet,
                    "Alert delivered"
                );
                state.active.push(alert);
                NotifyOutcome::Shown(channels)
            }
        };

        drop(state);
        self.record(&outcome);
        outcome
    }

    fn dismiss(&self, notification_id: &str) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let index = state
                .active
                .iter()
                .position(|alert| alert.notification_id == notification_id);
            index.map(|i| state.active.remove(i))
        };
        match removed {
            Some(alert) => {
                self.sink.dismiss(&alert.notification_id);
                DispatcherDiagnostics::incr(&self.diagnostics.dismissed);
                NOTIFICATIONS.with_label_values(&["dismissed"]).inc();
                true
            }
            None => false,
        }
    }

    async fn request_permission(&self) -> PermissionState {
        let state = self.permissions.request().await;
        tracing::info!(component = COMPONENT, permission = ?state, "Push permission resolved");
        state
    }

    fn set_preferences(&self, preferences: NotificationPreferences) {
        tracing::info!(
            component = COMPONENT,
            quiet_hours = preferences.quiet_hours.is_some(),
            disabled = preferences.disabled_categories.len(),
            "Notification preferences updated"
        );
        self.state.lock().preferences = preferences;
    }

    fn preferences(&self) -> NotificationPreferences {
        self.state.lock().preferences.clone()
    }

    fn active_alerts(&self) -> Vec<Alert> {
        self.state.lock().active.clone()
    }
}
