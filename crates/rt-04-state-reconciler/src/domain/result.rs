//! Outcome of one merge.

use shared_types::{EntityChange, Timestamp};

/// Why a delta was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The delta is not newer than what is stored.
    Stale {
        stored: Timestamp,
        incoming: Timestamp,
    },
}

/// Result of `apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedResult {
    pub applied: bool,
    pub reason: Option<RejectReason>,
    /// The change to announce when `applied` (or when a rollback alone
    /// altered the entity).
    pub change: Option<EntityChange>,
    /// A pending optimistic update was discarded first.
    pub rolled_back: bool,
}

impl AppliedResult {
    pub(crate) fn applied(change: EntityChange) -> Self {
        Self {
            applied: true,
            reason: None,
            change: Some(change),
            rolled_back: false,
        }
    }

    pub(crate) fn rejected(reason: RejectReason) -> Self {
        Self {
            applied: false,
            reason: Some(reason),
            change: None,
            rolled_back: false,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.reason, Some(RejectReason::Stale { .. }))
    }
}
