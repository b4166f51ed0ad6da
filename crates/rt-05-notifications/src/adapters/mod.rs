//! # Adapters
//!
//! Headless and test implementations of the platform ports.

pub mod clock;
pub mod permissions;
pub mod sinks;

pub use clock::{FixedClock, SystemClock};
pub use permissions::StaticPermissions;
pub use sinks::{AlertRecord, RecordingAlertSink, TracingAlertSink};
