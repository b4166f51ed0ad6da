//! Outbound port: where transport-level subscribe messages go.

use shared_types::{ClientMessage, ConnectionError};

/// Sink for `subscribe` / `unsubscribe` frames.
///
/// Implemented over the connection manager by the runtime.
pub trait SubscriptionSink {
    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError>;
}

impl<F> SubscriptionSink for F
where
    F: Fn(&ClientMessage) -> Result<(), ConnectionError>,
{
    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        self(message)
    }
}
