//! # Wiring
//!
//! The single task that owns the router and the subscription registry, and
//! the commands the `SyncClient` sends it.

pub mod commands;
pub mod event_loop;

pub use commands::{Command, LoopDiagnostics};
pub use event_loop::EventLoop;
