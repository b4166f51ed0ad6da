//! # Adapters
//!
//! Concrete transports.

pub mod mock;
pub mod websocket;

pub use mock::{MockConnection, MockOutcome, MockServer, MockTransport};
pub use websocket::WebSocketTransport;
