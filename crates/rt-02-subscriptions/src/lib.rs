//! # Subscription Registry
//!
//! Tracks which channels the client is interested in. Interest is
//! reference-counted: every `subscribe()` returns its own handle, but the
//! server only ever sees one `subscribe` per channel (on the 0 -> 1
//! transition) and one `unsubscribe` (on 1 -> 0).
//!
//! ## Offline Behavior
//!
//! Subscribing while disconnected records the intent only. When the
//! connection reaches `Connected` every active channel is replayed, because a
//! fresh connection carries no server-side subscriptions. The replay set is
//! exactly the set of channels with a live handle, so it cannot grow beyond
//! what consumers currently hold.
//!
//! ```text
//! subscribe(c) x N  ──►  refcount N  ──►  1 transport subscribe
//! unsubscribe  x N  ──►  refcount 0  ──►  1 transport unsubscribe
//! ```
//!
//! ## Module Structure
//!
//! - `domain/` - `ChannelRegistry` (pure ref-counting, no I/O)
//! - `ports/` - `SubscriptionApi` (inbound), `SubscriptionSink` (outbound)
//! - `adapters/` - `RecordingSink` for tests and tooling
//! - `application/` - `SubscriptionService` wiring the registry to a sink

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use adapters::RecordingSink;
pub use application::SubscriptionService;
pub use config::SubscriptionConfig;
pub use domain::{ChannelRegistry, RegistryAction, SubscriptionError, SubscriptionHandle};
pub use metrics::{SubscriptionDiagnostics, SubscriptionDiagnosticsSnapshot};
pub use ports::{SubscriptionApi, SubscriptionSink};

/// Component name used in logs and metric labels.
pub const COMPONENT: &str = "subscriptions";
