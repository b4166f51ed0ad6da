//! # RT-01 Connection Manager
//!
//! Owns the lifecycle of the single transport connection of a client session.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## State Machine
//!
//! ```text
//! disconnected -> connecting -> connected
//!                     |             |  transport error / heartbeat timeout
//!                     v             v
//!                 reconnecting <----+
//!                     |  backoff elapsed        attempts exhausted
//!                     +--> connecting           +--> disconnected (gave up)
//! ```
//!
//! ## Guarantees
//!
//! | Concern | Behavior |
//! |---------|----------|
//! | Backoff | Exponential with jitter, capped; attempt counter reset on success |
//! | Give-up | After `max_attempts` failed reconnects; no further attempt is scheduled |
//! | Heartbeat | Periodic ping; no inbound traffic within the timeout forces a reconnect |
//! | `send()` | Fails fast with `NotConnected` unless connected; never queues silently |
//! | Disconnect | Cancels pending backoff timers and the heartbeat |
//!
//! ## Module Structure
//!
//! ```text
//! rt-01-connection/
//! ├── domain/          # Backoff policy, retry tracker, transport events
//! ├── ports/           # ConnectionControl (inbound), Transport (outbound)
//! ├── adapters/        # WebSocketTransport, MockTransport
//! ├── application/     # ConnectionManager supervisor
//! ├── config.rs        # ConnectionOptions
//! └── metrics.rs       # ConnectionDiagnostics
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use adapters::{MockConnection, MockOutcome, MockServer, MockTransport, WebSocketTransport};
pub use application::ConnectionManager;
pub use config::ConnectionOptions;
pub use domain::{BackoffPolicy, RetryDecision, RetryTracker, TransportEvent};
pub use metrics::{ConnectionDiagnostics, ConnectionDiagnosticsSnapshot};
pub use ports::{ConnectionControl, Frame, FrameSink, FrameSource, Transport, TransportPair};

/// Component name used in logs.
pub const COMPONENT: &str = "connection";
