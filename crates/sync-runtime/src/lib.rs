//! # Repair-Sync Runtime
//!
//! Wires the sync components into a single client.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the `SyncClientBuilder`
//! - `adapters/` - Port implementations connecting components
//! - `handlers/` - The entity pipeline run for every routed message
//! - `wiring/` - The event loop and its command protocol
//! - `client` - The `SyncClient` facade
//!
//! ## Flow
//!
//! ```text
//! Transport ──frames──► ConnectionManager ──TransportEvent──► EventLoop
//!                                                               │
//!                     SubscriptionRegistry ◄── channel gate ── MessageRouter
//!                                                               │
//!                                                          SyncPipeline
//!                                   StateReconciler ─► NotificationDispatcher
//!                                          │                    │
//!                                   ExpirationSweeper      AlertSink
//!                                          │
//!                                    InMemoryEventBus ──► consumers
//! ```
//!
//! ## Threading
//!
//! The router and the subscription registry live on the event loop task and
//! are only reached through commands. The reconciler, dispatcher and sweeper
//! are internally synchronized and shared with the facade.

pub mod adapters;
pub mod client;
pub mod container;
pub mod error;
pub mod handlers;
pub mod wiring;

pub use client::{ClientDiagnostics, SubscriptionGuard, SyncClient};
pub use container::{ConfigError, SyncClientBuilder, SyncConfig};
pub use error::SyncError;

/// Component name used in logs.
pub const COMPONENT: &str = "runtime";
