//! Entity change notifications emitted after reconciliation.

use serde::{Deserialize, Serialize};

use crate::entities::{EntityId, EntityKind};
use crate::Timestamp;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// First sighting of the id.
    Inserted,
    /// An existing entity was merged.
    Updated,
    /// Removed by a delete message, user action, or expiry.
    Removed,
    /// Restored to its pre-optimistic state.
    RolledBack,
}

/// A change to one entity in a local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChange {
    pub kind: EntityKind,
    pub id: EntityId,
    pub op: ChangeOp,
    /// `updated_at` of the entity after the change, absent for removals.
    pub updated_at: Option<Timestamp>,
}

impl EntityChange {
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<EntityId>, op: ChangeOp) -> Self {
        Self {
            kind,
            id: id.into(),
            op,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Whether the entity still exists after this change.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.op == ChangeOp::Removed
    }
}
