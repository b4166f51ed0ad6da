//! # Adapters
//!
//! Port implementations connecting components to each other.

pub mod connection_sink;

pub use connection_sink::ConnectionSink;
