//! # Expiration Sweeper
//!
//! Removes time-boxed entities from local state once they expire.
//!
//! ## Rule
//!
//! An entity is removed when it carries `expires_at`, that instant is not in
//! the future, and it is not `persistent`. Persistent entities stay no matter
//! how old their expiry is. Removal is local only and never reaches the server.
//!
//! ## Triggers
//!
//! - A fixed-interval tick (`SweeperConfig::interval`, 60s by default).
//! - On demand, after each notification is delivered.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use application::ExpirationSweeper;
pub use config::SweeperConfig;
pub use domain::SweepReport;
pub use metrics::{SweeperDiagnostics, SweeperDiagnosticsSnapshot};
pub use ports::ExpiringStore;

/// Component name used in logs and metric labels.
pub const COMPONENT: &str = "expiration";
