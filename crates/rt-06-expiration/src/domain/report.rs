//! Result of one sweep.

use serde::{Deserialize, Serialize};
use shared_types::{EntityChange, EntityId, EntityKind, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Instant the expiry comparison used.
    pub swept_at: Timestamp,
    /// One `Removed` change per expired entity.
    pub removed: Vec<EntityChange>,
}

impl SweepReport {
    pub fn new(swept_at: Timestamp, removed: Vec<EntityChange>) -> Self {
        Self { swept_at, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }

    /// Ids removed for one entity kind.
    pub fn ids(&self, kind: EntityKind) -> Vec<EntityId> {
        self.removed
            .iter()
            .filter(|change| change.kind == kind)
            .map(|change| change.id.clone())
            .collect()
    }
}
