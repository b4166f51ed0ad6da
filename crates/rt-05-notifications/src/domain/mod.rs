//! # Domain Layer
//!
//! Everything here is pure: no clocks, no I/O.

pub mod alert;
pub mod errors;
pub mod policy;
pub mod preferences;
pub mod rate_limit;

pub use alert::{Alert, DeliveryChannels, NotifyOutcome, SuppressReason};
pub use errors::DeliveryError;
pub use policy::{evaluate, Decision, PolicyContext};
pub use preferences::{NotificationPreferences, PermissionState, PlatformCapabilities, QuietHours};
pub use rate_limit::AlertRateLimiter;
