//! # Application Layer
//!
//! The connection manager and its supervisor task.

pub mod manager;

pub use manager::ConnectionManager;
