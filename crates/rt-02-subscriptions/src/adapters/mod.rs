//! # Adapters

pub mod recording;

pub use recording::RecordingSink;
