//! Inbound port: the untyped reconciliation API used by the message path.
//!
//! Typed access (`get::<E>`, `apply::<E>`) is on `StateReconciler` itself.

use shared_types::{EntityChange, EntityKind, InboundMessage};

use crate::domain::{AppliedResult, ReconcileError};

/// State Reconciler API - inbound port.
pub trait ReconcilerApi: Send + Sync {
    /// Decode `payload` as a delta of `kind` and merge it.
    fn apply_json(
        &self,
        kind: EntityKind,
        payload: &serde_json::Value,
    ) -> Result<AppliedResult, ReconcileError>;

    /// Merge an upsert message or apply an `entity_deleted` message.
    fn apply_message(&self, message: &InboundMessage) -> Result<AppliedResult, ReconcileError>;

    /// Remove an entity. `None` if the id was unknown.
    fn remove(&self, kind: EntityKind, id: &str) -> Option<EntityChange>;

    fn contains(&self, kind: EntityKind, id: &str) -> bool;

    fn count(&self, kind: EntityKind) -> usize;
}
