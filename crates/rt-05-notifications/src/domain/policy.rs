//! # Delivery Policy
//!
//! The stateless part of the pipeline: given an item and the current
//! context, decide whether to show, update or suppress, and on which
//! channels. Rate limiting is stateful and applied by the dispatcher.

use shared_types::{Expirable, NotificationItem, Priority, Timestamp};

use super::alert::{DeliveryChannels, SuppressReason};
use super::preferences::{NotificationPreferences, PermissionState, PlatformCapabilities};

/// Inputs of one policy decision.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub preferences: &'a NotificationPreferences,
    pub capabilities: PlatformCapabilities,
    pub permission: PermissionState,
    pub now: Timestamp,
    /// An unread alert with this id is already shown.
    pub already_shown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Suppress(SuppressReason),
    /// Refresh the existing alert in place.
    Update,
    Show(DeliveryChannels),
}

/// Run the category, quiet-hours, dedup and delivery stages.
pub fn evaluate(item: &NotificationItem, ctx: &PolicyContext<'_>) -> Decision {
    // 1. Category gate
    if !ctx.preferences.is_category_enabled(item.category) {
        return Decision::Suppress(SuppressReason::CategoryDisabled);
    }
    if item.read {
        return Decision::Suppress(SuppressReason::AlreadyRead);
    }
    if item.is_expired(ctx.now) {
        return Decision::Suppress(SuppressReason::Expired);
    }

    // 2. Quiet hours
    let quiet = item.priority != Priority::Urgent && ctx.preferences.is_quiet(ctx.now);

    // 3. Dedup
    if ctx.already_shown {
        return Decision::Update;
    }

    // 4. Delivery
    let mut channels = DeliveryChannels {
        quiet,
        ..DeliveryChannels::in_app_only()
    };
    if quiet || item.priority == Priority::Low {
        return Decision::Show(channels);
    }

    let prefs = ctx.preferences;
    channels.sound = prefs.sound_enabled && ctx.capabilities.sound;
    channels.haptic = prefs.haptic_enabled && ctx.capabilities.haptic;
    if prefs.push_enabled && ctx.capabilities.push {
        if ctx.permission.is_granted() {
            channels.push = true;
        } else {
            channels.push_degraded = true;
        }
    }
    Decision::Show(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::preferences::QuietHours;
    use chrono::{NaiveTime, TimeZone, Utc};
    use shared_types::NotificationCategory;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap()
    }

    fn item(priority: Priority) -> NotificationItem {
        let mut item = NotificationItem::new("n1", now(), "Device ready");
        item.priority = priority;
        item.category = NotificationCategory::Pickup;
        item
    }

    fn ctx(prefs: &NotificationPreferences) -> PolicyContext<'_> {
        PolicyContext {
            preferences: prefs,
            capabilities: PlatformCapabilities::full(),
            permission: PermissionState::Granted,
            now: now(),
            already_shown: false,
        }
    }

    fn quiet_prefs() -> NotificationPreferences {
        NotificationPreferences {
            quiet_hours: Some(QuietHours::new(
                NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            )),
            ..NotificationPreferences::default()
        }
    }

    #[test]
    fn test_full_delivery() {
        let prefs = NotificationPreferences::default();
        let Decision::Show(channels) = evaluate(&item(Priority::High), &ctx(&prefs)) else {
            panic!("expected show");
        };
        assert!(channels.sound && channels.haptic && channels.push);
    }

    #[test]
    fn test_category_gate_first() {
        let mut prefs = NotificationPreferences::default();
        prefs.disabled_categories.insert(NotificationCategory::Pickup);
        let mut context = ctx(&prefs);
        context.already_shown = true;
        assert_eq!(
            evaluate(&item(Priority::Urgent), &context),
            Decision::Suppress(SuppressReason::CategoryDisabled)
        );
    }

    #[test]
    fn test_quiet_hours_in_app_only() {
        let prefs = quiet_prefs();
        let decision = evaluate(&item(Priority::High), &ctx(&prefs));
        let Decision::Show(channels) = decision else {
            panic!("expected show");
        };
        assert!(!channels.is_intrusive());
        assert!(channels.quiet);
    }

    #[test]
    fn test_urgent_bypasses_quiet_hours() {
        let prefs = quiet_prefs();
        let Decision::Show(channels) = evaluate(&item(Priority::Urgent), &ctx(&prefs)) else {
            panic!("expected show");
        };
        assert!(channels.sound);
        assert!(!channels.quiet);
    }

    #[test]
    fn test_dedup_updates_in_place() {
        let prefs = NotificationPreferences::default();
        let mut context = ctx(&prefs);
        context.already_shown = true;
        assert_eq!(evaluate(&item(Priority::High), &context), Decision::Update);
    }

    #[test]
    fn test_missing_permission_degrades_push() {
        let prefs = NotificationPreferences::default();
        let mut context = ctx(&prefs);
        context.permission = PermissionState::Denied;
        let Decision::Show(channels) = evaluate(&item(Priority::High), &context) else {
            panic!("expected show");
        };
        assert!(!channels.push);
        assert!(channels.push_degraded);
        assert!(channels.sound);
    }

    #[test]
    fn test_capabilities_and_toggles() {
        let prefs = NotificationPreferences {
            sound_enabled: false,
            ..NotificationPreferences::default()
        };
        let mut context = ctx(&prefs);
        context.capabilities = PlatformCapabilities {
            sound: true,
            haptic: false,
            push: true,
        };
        let Decision::Show(channels) = evaluate(&item(Priority::Normal), &context) else {
            panic!("expected show");
        };
        assert!(!channels.sound && !channels.haptic && channels.push);
    }

    #[test]
    fn test_low_priority_in_app_only() {
        let prefs = NotificationPreferences::default();
        let Decision::Show(channels) = evaluate(&item(Priority::Low), &ctx(&prefs)) else {
            panic!("expected show");
        };
        assert!(!channels.is_intrusive());
    }

    #[test]
    fn test_read_and_expired_suppressed() {
        let prefs = NotificationPreferences::default();
        let mut read = item(Priority::High);
        read.read = true;
        assert_eq!(
            evaluate(&read, &ctx(&prefs)),
            Decision::Suppress(SuppressReason::AlreadyRead)
        );

        let mut expired = item(Priority::High);
        expired.expires_at = Some(now() - chrono::Duration::minutes(1));
        assert_eq!(
            evaluate(&expired, &ctx(&prefs)),
            Decision::Suppress(SuppressReason::Expired)
        );
    }
}
