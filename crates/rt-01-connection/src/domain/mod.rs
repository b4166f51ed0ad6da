//! # Domain Module
//!
//! Pure connection rules: backoff delays, retry accounting, and the events
//! the supervisor feeds into the sync loop.

pub mod backoff;
pub mod events;
pub mod retry;

pub use backoff::BackoffPolicy;
pub use events::TransportEvent;
pub use retry::{RetryDecision, RetryTracker};
