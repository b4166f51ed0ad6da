//! # Ports
//!
//! Hexagonal architecture ports (inbound API, outbound platform dependencies).

pub mod inbound;
pub mod outbound;

pub use inbound::NotificationApi;
pub use outbound::{AlertSink, Clock, PermissionRequester};
