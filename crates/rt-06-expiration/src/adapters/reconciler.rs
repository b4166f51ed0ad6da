//! `ExpiringStore` over the reconciler's entity stores.
//!
//! Notifications are the only time-boxed entity kind.

use rt_04_state_reconciler::StateReconciler;
use shared_types::{EntityChange, Expirable, NotificationItem, Timestamp};

use crate::ports::ExpiringStore;

impl ExpiringStore for StateReconciler {
    fn remove_expired(&self, now: Timestamp) -> Vec<EntityChange> {
        self.remove_where::<NotificationItem>(|item| item.is_expired(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rt_04_state_reconciler::ReconcilerApi;
    use shared_types::{ChangeOp, EntityKind};

    #[test]
    fn test_only_expired_notifications_removed() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let reconciler = StateReconciler::new();
        let past = (now - Duration::minutes(5)).to_rfc3339();
        let future = (now + Duration::minutes(5)).to_rfc3339();
        let at = (now - Duration::hours(1)).to_rfc3339();

        for (id, expires, persistent) in [
            ("gone", past.as_str(), false),
            ("kept-persistent", past.as_str(), true),
            ("kept-future", future.as_str(), false),
        ] {
            reconciler
                .apply_json(
                    EntityKind::Notification,
                    &serde_json::json!({
                        "id": id,
                        "updated_at": at,
                        "title": id,
                        "expires_at": expires,
                        "persistent": persistent,
                    }),
                )
                .unwrap();
        }

        let removed = reconciler.remove_expired(now);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "gone");
        assert_eq!(removed[0].op, ChangeOp::Removed);
        assert!(reconciler.contains(EntityKind::Notification, "kept-persistent"));
        assert!(reconciler.contains(EntityKind::Notification, "kept-future"));
    }
}
