//! # Message Router
//!
//! Classifies inbound frames by `(type, channel)` and hands them to the
//! handlers registered for that pair.
//!
//! ## Dispatch Pipeline
//!
//! ```text
//! frame ─► parse ─► known type? ─► channel subscribed? ─► handlers (registration order)
//!            │          │                 │
//!         malformed  unknown_type     unsubscribed        (all dropped + counted)
//! ```
//!
//! `heartbeat_ack` is a control message. It skips the subscription gate.
//!
//! ## Ordering
//!
//! The router is a plain synchronous object driven by one task. Messages are
//! handled strictly in the order `dispatch` is called; nothing is queued,
//! reordered or run concurrently. Sequence numbers, when present, are only
//! checked for gaps and counted.

pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod router;

pub use config::RouterConfig;
pub use domain::{ChannelPattern, DispatchOutcome, HandlerId, RouteError};
pub use metrics::{RouterDiagnostics, RouterDiagnosticsSnapshot};
pub use ports::{ChannelGate, MessageHandler};
pub use router::MessageRouter;

/// Component name used in logs and metric labels.
pub const COMPONENT: &str = "router";
