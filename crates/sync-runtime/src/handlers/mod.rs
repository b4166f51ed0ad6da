//! # Handlers
//!
//! What happens to an inbound message after routing.

pub mod pipeline;

pub use pipeline::SyncPipeline;
