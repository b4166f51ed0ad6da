//! # Adapters

pub mod reconciler;
