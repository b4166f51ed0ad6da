//! Sink that records every message, optionally failing sends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{ClientMessage, ClientOp, ConnectionError};

use crate::ports::SubscriptionSink;

/// Recording sink. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<ClientMessage>>>,
    offline: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with `NotConnected`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().clone()
    }

    /// Number of recorded messages with the given op.
    pub fn count(&self, op: ClientOp) -> usize {
        self.sent.lock().iter().filter(|m| m.op == op).count()
    }
}

impl SubscriptionSink for RecordingSink {
    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
