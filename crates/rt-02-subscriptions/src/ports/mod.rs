//! # Ports
//!
//! Hexagonal architecture ports (inbound API, outbound dependencies).

pub mod inbound;
pub mod outbound;

pub use inbound::SubscriptionApi;
pub use outbound::SubscriptionSink;
