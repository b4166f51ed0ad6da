//! # Ports
//!
//! Handler and subscription-gate seams.

pub mod inbound;

pub use inbound::{ChannelGate, MessageHandler};
