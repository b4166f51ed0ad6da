//! # Entity Store
//!
//! The reconciled state of one entity family, keyed by id.

use std::collections::HashMap;

use shared_types::{ChangeOp, Delta, Entity, EntityChange, EntityId};

use super::result::{AppliedResult, RejectReason};

/// Local store for entities of type `E`.
///
/// `pending` holds the pre-image of every entity with an unconfirmed
/// optimistic update (`None` when the optimistic update inserted it).
#[derive(Debug, Clone)]
pub struct EntityStore<E: Entity> {
    entities: HashMap<EntityId, E>,
    pending: HashMap<EntityId, Option<E>>,
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.entities.values()
    }

    /// Apply an authoritative delta.
    ///
    /// A pending optimistic update for the same id is discarded first, then
    /// the delta is merged under the timestamp rule.
    pub fn apply(&mut self, delta: E::Delta) -> AppliedResult {
        let restored = self.restore(delta.id());
        let mut result = self.merge(delta);
        if let Some(change) = restored {
            result.rolled_back = true;
            if result.change.is_none() {
                result.change = Some(change);
            }
        }
        result
    }

    /// Apply a local, not yet confirmed delta and remember how to undo it.
    pub fn apply_optimistic(&mut self, delta: E::Delta) -> AppliedResult {
        let id = delta.id().to_string();
        let pre_image = self.entities.get(&id).cloned();
        let result = self.merge(delta);
        if result.applied {
            // Only the first optimistic update records the pre-image.
            self.pending.entry(id).or_insert(pre_image);
        }
        result
    }

    /// Undo a pending optimistic update.
    pub fn rollback(&mut self, id: &str) -> Option<EntityChange> {
        self.restore(id)
    }

    pub fn has_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Remove an entity. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<E> {
        self.pending.remove(id);
        self.entities.remove(id)
    }

    /// Remove every entity matching `predicate`; returns the removed ids.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&E) -> bool) -> Vec<EntityId> {
        let doomed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| predicate(entity))
            .map(|entity| entity.id().to_string())
            .collect();
        for id in &doomed {
            self.remove(id);
        }
        doomed
    }

    fn merge(&mut self, delta: E::Delta) -> AppliedResult {
        let incoming = delta.updated_at();
        match self.entities.get_mut(delta.id()) {
            Some(stored) if incoming <= stored.updated_at() => {
                AppliedResult::rejected(RejectReason::Stale {
                    stored: stored.updated_at(),
                    incoming,
                })
            }
            Some(stored) => {
                stored.merge(delta);
                let change =
                    EntityChange::new(E::KIND, stored.id(), ChangeOp::Updated).at(incoming);
                AppliedResult::applied(change)
            }
            None => {
                let entity = E::from_delta(delta);
                let change =
                    EntityChange::new(E::KIND, entity.id(), ChangeOp::Inserted).at(incoming);
                self.entities.insert(entity.id().to_string(), entity);
                AppliedResult::applied(change)
            }
        }
    }

    fn restore(&mut self, id: &str) -> Option<EntityChange> {
        match self.pending.remove(id)? {
            Some(pre_image) => {
                let change = EntityChange::new(E::KIND, id, ChangeOp::RolledBack)
                    .at(pre_image.updated_at());
                self.entities.insert(id.to_string(), pre_image);
                Some(change)
            }
            None => {
                self.entities.remove(id);
                Some(EntityChange::new(E::KIND, id, ChangeOp::Removed))
            }
        }
    }
}
