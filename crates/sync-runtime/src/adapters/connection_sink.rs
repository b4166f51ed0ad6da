//! `SubscriptionSink` over the connection manager.

use std::sync::Arc;

use rt_01_connection::ConnectionControl;
use rt_02_subscriptions::SubscriptionSink;
use shared_types::{ClientMessage, ConnectionError};

/// Sends subscription frames through the live connection.
#[derive(Clone)]
pub struct ConnectionSink {
    connection: Arc<dyn ConnectionControl>,
}

impl ConnectionSink {
    pub fn new(connection: Arc<dyn ConnectionControl>) -> Self {
        Self { connection }
    }
}

impl SubscriptionSink for ConnectionSink {
    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        self.connection.send(message)
    }
}
