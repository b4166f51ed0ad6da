//! # State Reconciler
//!
//! Owns one `EntityStore` per entity family. The sync loop is the single
//! writer; UI consumers read snapshots through shared references, so each
//! store sits behind a read/write lock.

use parking_lot::RwLock;
use shared_types::{
    ChangeOp, Entity, EntityChange, EntityDeleted, EntityKind, InboundMessage, MessageType,
    NotificationItem, ProtocolError, RepairPhoto, RepairProgress,
};
use sync_telemetry::{log_entity_event, ENTITIES_STORED, RECONCILER_MERGES};

use crate::domain::{AppliedResult, EntityStore, ReconcileError};
use crate::metrics::{ReconcilerDiagnostics, ReconcilerDiagnosticsSnapshot};
use crate::ports::ReconcilerApi;
use crate::COMPONENT;

/// Entities the reconciler has a store for.
pub trait Reconcilable: Entity {
    fn store(reconciler: &StateReconciler) -> &RwLock<EntityStore<Self>>;
}

impl Reconcilable for RepairProgress {
    fn store(reconciler: &StateReconciler) -> &RwLock<EntityStore<Self>> {
        &reconciler.repairs
    }
}

impl Reconcilable for NotificationItem {
    fn store(reconciler: &StateReconciler) -> &RwLock<EntityStore<Self>> {
        &reconciler.notifications
    }
}

impl Reconcilable for RepairPhoto {
    fn store(reconciler: &StateReconciler) -> &RwLock<EntityStore<Self>> {
        &reconciler.photos
    }
}

#[derive(Default)]
pub struct StateReconciler {
    repairs: RwLock<EntityStore<RepairProgress>>,
    notifications: RwLock<EntityStore<NotificationItem>>,
    photos: RwLock<EntityStore<RepairPhoto>>,
    diagnostics: ReconcilerDiagnostics,
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an authoritative delta.
    pub fn apply<E: Reconcilable>(&self, delta: E::Delta) -> AppliedResult {
        let (result, stored) = {
            let mut store = E::store(self).write();
            let result = store.apply(delta);
            (result, store.len())
        };
        self.record(E::KIND, &result, stored);
        result
    }

    /// Merge a local delta that the server has not confirmed yet.
    pub fn apply_optimistic<E: Reconcilable>(&self, delta: E::Delta) -> AppliedResult {
        let (result, stored) = {
            let mut store = E::store(self).write();
            let result = store.apply_optimistic(delta);
            (result, store.len())
        };
        if result.applied {
            ReconcilerDiagnostics::incr(&self.diagnostics.optimistic_applied);
        }
        self.record(E::KIND, &result, stored);
        result
    }

    /// Undo a pending optimistic update (e.g. its send failed).
    pub fn rollback<E: Reconcilable>(&self, id: &str) -> Option<EntityChange> {
        let change = E::store(self).write().rollback(id)?;
        ReconcilerDiagnostics::incr(&self.diagnostics.rolled_back);
        RECONCILER_MERGES
            .with_label_values(&[E::KIND.as_str(), "rolled_back"])
            .inc();
        log_entity_event!(debug, COMPONENT, "Optimistic update rolled back", E::KIND, id);
        Some(change)
    }

    pub fn get<E: Reconcilable>(&self, id: &str) -> Option<E> {
        E::store(self).read().get(id).cloned()
    }

    /// All entities of one family, ordered by id.
    pub fn snapshot<E: Reconcilable>(&self) -> Vec<E> {
        let mut all: Vec<E> = E::store(self).read().values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    pub fn has_pending<E: Reconcilable>(&self, id: &str) -> bool {
        E::store(self).read().has_pending(id)
    }

    /// Remove every entity of `E` matching `predicate`.
    pub fn remove_where<E: Reconcilable>(
        &self,
        predicate: impl FnMut(&E) -> bool,
    ) -> Vec<EntityChange> {
        let (ids, stored) = {
            let mut store = E::store(self).write();
            let ids = store.remove_where(predicate);
            (ids, store.len())
        };
        ReconcilerDiagnostics::add(&self.diagnostics.removed, ids.len() as u64);
        ENTITIES_STORED
            .with_label_values(&[E::KIND.as_str()])
            .set(stored as f64);
        ids.into_iter()
            .map(|id| EntityChange::new(E::KIND, id, ChangeOp::Removed))
            .collect()
    }

    pub fn diagnostics(&self) -> ReconcilerDiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    fn apply_value<E: Reconcilable>(
        &self,
        payload: &serde_json::Value,
    ) -> Result<AppliedResult, ReconcileError> {
        let delta: E::Delta = serde_json::from_value(payload.clone()).map_err(|e| {
            ReconcilerDiagnostics::incr(&self.diagnostics.invalid_payloads);
            ProtocolError::InvalidPayload {
                message_type: E::KIND.as_str().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(self.apply::<E>(delta))
    }

    fn remove_typed<E: Reconcilable>(&self, id: &str) -> Option<EntityChange> {
        let (removed, stored) = {
            let mut store = E::store(self).write();
            let removed = store.remove(id).is_some();
            (removed, store.len())
        };
        if !removed {
            return None;
        }
        ReconcilerDiagnostics::incr(&self.diagnostics.removed);
        RECONCILER_MERGES
            .with_label_values(&[E::KIND.as_str(), "removed"])
            .inc();
        ENTITIES_STORED
            .with_label_values(&[E::KIND.as_str()])
            .set(stored as f64);
        log_entity_event!(debug, COMPONENT, "Entity removed", E::KIND, id);
        Some(EntityChange::new(E::KIND, id, ChangeOp::Removed))
    }

    fn record(&self, kind: EntityKind, result: &AppliedResult, stored: usize) {
        let outcome = match result.change.as_ref().map(|c| c.op) {
            _ if result.is_stale() => {
                ReconcilerDiagnostics::incr(&self.diagnostics.rejected_stale);
                "rejected"
            }
            Some(ChangeOp::Inserted) => {
                ReconcilerDiagnostics::incr(&self.diagnostics.inserted);
                "inserted"
            }
            Some(ChangeOp::Updated) => {
                ReconcilerDiagnostics::incr(&self.diagnostics.updated);
                "updated"
            }
            _ => "noop",
        };
        if result.rolled_back {
            ReconcilerDiagnostics::incr(&self.diagnostics.rolled_back);
        }
        RECONCILER_MERGES
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
        ENTITIES_STORED
            .with_label_values(&[kind.as_str()])
            .set(stored as f64);

        if let Some(reason) = &result.reason {
            tracing::debug!(component = COMPONENT, kind = %kind, reason = ?reason, "Delta rejected");
        }
    }
}

impl ReconcilerApi for StateReconciler {
    fn apply_json(
        &self,
        kind: EntityKind,
        payload: &serde_json::Value,
    ) -> Result<AppliedResult, ReconcileError> {
        match kind {
            EntityKind::RepairProgress => self.apply_value::<RepairProgress>(payload),
            EntityKind::Notification => self.apply_value::<NotificationItem>(payload),
            EntityKind::Photo => self.apply_value::<RepairPhoto>(payload),
        }
    }

    fn apply_message(&self, message: &InboundMessage) -> Result<AppliedResult, ReconcileError> {
        if message.message_type == MessageType::EntityDeleted {
            let deleted: EntityDeleted = message.payload_as().map_err(|e| {
                ReconcilerDiagnostics::incr(&self.diagnostics.invalid_payloads);
                e
            })?;
            let change = self.remove(deleted.kind, &deleted.id);
            return Ok(AppliedResult {
                applied: change.is_some(),
                reason: None,
                change,
                rolled_back: false,
            });
        }

        let kind = message
            .message_type
            .entity_kind()
            .ok_or_else(|| ReconcileError::NotAnEntityMessage(message.message_type.clone()))?;
        self.apply_json(kind, &message.payload)
    }

    fn remove(&self, kind: EntityKind, id: &str) -> Option<EntityChange> {
        match kind {
            EntityKind::RepairProgress => self.remove_typed::<RepairProgress>(id),
            EntityKind::Notification => self.remove_typed::<NotificationItem>(id),
            EntityKind::Photo => self.remove_typed::<RepairPhoto>(id),
        }
    }

    fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::RepairProgress => self.repairs.read().contains(id),
            EntityKind::Notification => self.notifications.read().contains(id),
            EntityKind::Photo => self.photos.read().contains(id),
        }
    }

    fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::RepairProgress => self.repairs.read().len(),
            EntityKind::Notification => self.notifications.read().len(),
            EntityKind::Photo => self.photos.read().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use shared_types::{Channel, NotificationDelta, Timestamp};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn message(kind: &str, payload: serde_json::Value) -> InboundMessage {
        InboundMessage {
            message_type: MessageType::from(kind),
            channel: Channel::new("test"),
            payload,
            ts: ts(0),
            sequence: None,
        }
    }

    #[test]
    fn test_apply_json_by_kind() {
        let reconciler = StateReconciler::new();
        let result = reconciler
            .apply_json(
                EntityKind::RepairProgress,
                &json!({"id": "r1", "updated_at": "2024-05-01T10:00:00Z", "status": "in_repair", "progress_percent": 40}),
            )
            .unwrap();

        assert!(result.applied);
        let repair = reconciler.get::<RepairProgress>("r1").unwrap();
        assert_eq!(repair.progress_percent, 40);
        assert_eq!(reconciler.count(EntityKind::RepairProgress), 1);
    }

    #[test]
    fn test_invalid_payload_is_an_error() {
        let reconciler = StateReconciler::new();
        let result = reconciler.apply_json(EntityKind::Photo, &json!({"no_id": true}));
        assert!(matches!(result, Err(ReconcileError::InvalidPayload(_))));
        assert_eq!(reconciler.diagnostics().invalid_payloads, 1);
    }

    #[test]
    fn test_rejections_are_counted() {
        let reconciler = StateReconciler::new();
        reconciler.apply::<NotificationItem>(NotificationDelta::new("n1", ts(2)));
        let stale = reconciler.apply::<NotificationItem>(NotificationDelta::new("n1", ts(1)));

        assert!(!stale.applied);
        let diagnostics = reconciler.diagnostics();
        assert_eq!(diagnostics.applied, 1);
        assert_eq!(diagnostics.rejected_stale, 1);
    }

    #[test]
    fn test_delete_message() {
        let reconciler = StateReconciler::new();
        reconciler
            .apply_message(&message(
                "repair_photo",
                json!({"id": "p1", "updated_at": "2024-05-01T10:00:00Z", "repair_id": "42", "url": "https://img/p1.jpg"}),
            ))
            .unwrap();

        let result = reconciler
            .apply_message(&message("entity_deleted", json!({"kind": "photo", "id": "p1"})))
            .unwrap();
        assert_eq!(result.change.unwrap().op, ChangeOp::Removed);
        assert!(!reconciler.contains(EntityKind::Photo, "p1"));

        let again = reconciler
            .apply_message(&message("entity_deleted", json!({"kind": "photo", "id": "p1"})))
            .unwrap();
        assert!(!again.applied);
    }

    #[test]
    fn test_non_entity_message_rejected() {
        let reconciler = StateReconciler::new();
        let result = reconciler.apply_message(&message("heartbeat_ack", json!({})));
        assert!(matches!(result, Err(ReconcileError::NotAnEntityMessage(_))));
    }

    #[test]
    fn test_optimistic_mark_read_and_rollback() {
        let reconciler = StateReconciler::new();
        reconciler.apply::<NotificationItem>(NotificationDelta::new("n1", ts(1)));

        let mut mark_read = NotificationDelta::new("n1", ts(5));
        mark_read.read = Some(true);
        assert!(reconciler.apply_optimistic::<NotificationItem>(mark_read).applied);
        assert!(reconciler.get::<NotificationItem>("n1").unwrap().read);

        reconciler.rollback::<NotificationItem>("n1").unwrap();
        assert!(!reconciler.get::<NotificationItem>("n1").unwrap().read);
        assert_eq!(reconciler.diagnostics().rolled_back, 1);
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let reconciler = StateReconciler::new();
        for id in ["c", "a", "b"] {
            reconciler.apply::<NotificationItem>(NotificationDelta::new(id, ts(1)));
        }
        let ids: Vec<_> = reconciler
            .snapshot::<NotificationItem>()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
