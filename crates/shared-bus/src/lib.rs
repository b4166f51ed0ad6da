//! # Shared Bus - Event Bus for Sync Observers
//!
//! The reconciler is the single writer of the entity stores. Everything else
//! (UI components, the notification dispatcher, connectivity indicators)
//! observes changes through this bus and never mutates state directly.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Sync loop   │                    │   Observer   │
//! │              │    publish()       │  (UI, CLI)   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Slow observers lag and skip events rather than applying backpressure to
//! the sync loop.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{AlertEvent, EventFilter, EventTopic, SyncEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
