//! # Ports

use shared_types::{EntityChange, Timestamp};

/// A store holding entities that may expire.
pub trait ExpiringStore: Send + Sync {
    /// Remove every non-persistent entity whose expiry is at or before `now`,
    /// returning one `Removed` change per entity.
    fn remove_expired(&self, now: Timestamp) -> Vec<EntityChange>;
}

impl<S: ExpiringStore + ?Sized> ExpiringStore for std::sync::Arc<S> {
    fn remove_expired(&self, now: Timestamp) -> Vec<EntityChange> {
        (**self).remove_expired(now)
    }
}
