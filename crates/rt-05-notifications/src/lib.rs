//! # Notification Dispatcher
//!
//! Turns reconciled notifications into user-visible alerts.
//!
//! ## Policy Pipeline
//!
//! Each stage may stop or narrow delivery:
//!
//! | Stage | Effect |
//! |-------|--------|
//! | 1. Category gate | Category disabled in preferences: no alert at all |
//! | 2. Quiet hours | Inside the window: in-app only, unless `Urgent` |
//! | 3. Dedup | Same id already shown and unread: updated in place, no new alert |
//! | 4. Delivery | In-app always; sound, haptic and push each need the preference toggle and platform support; push also needs granted permission |
//!
//! Intrusive channels are additionally limited by a token bucket, and `Low`
//! priority items never use them. A missing push permission downgrades
//! delivery to in-app only and is never reported as an error.
//!
//! ## Module Structure
//!
//! - `domain/` - preferences, alerts, the pure policy and the rate limiter
//! - `ports/` - `NotificationApi` (inbound); `AlertSink`, `PermissionRequester`, `Clock` (outbound)
//! - `adapters/` - tracing/recording sinks, static permissions, system/fixed clocks
//! - `application/` - `NotificationDispatcher`

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use adapters::{
    AlertRecord, FixedClock, RecordingAlertSink, StaticPermissions, SystemClock, TracingAlertSink,
};
pub use application::NotificationDispatcher;
pub use config::DispatcherConfig;
pub use domain::{
    Alert, DeliveryChannels, DeliveryError, NotificationPreferences, NotifyOutcome,
    PermissionState, PlatformCapabilities, QuietHours, SuppressReason,
};
pub use metrics::{DispatcherDiagnostics, DispatcherDiagnosticsSnapshot};
pub use ports::{AlertSink, Clock, NotificationApi, PermissionRequester};

/// Component name used in logs and metric labels.
pub const COMPONENT: &str = "notifications";
