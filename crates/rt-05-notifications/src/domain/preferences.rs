//! User preferences and platform facts the policy depends on.

use std::collections::HashSet;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use shared_types::{NotificationCategory, Timestamp};

/// Daily quiet window in local time. May wrap midnight (`22:00-07:00`).
/// A window whose start equals its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `time` falls inside the window. Start inclusive, end exclusive.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Per-user notification preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub disabled_categories: HashSet<NotificationCategory>,
    pub quiet_hours: Option<QuietHours>,
    /// Offset of the user's local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
    pub push_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            disabled_categories: HashSet::new(),
            quiet_hours: None,
            utc_offset_minutes: 0,
            sound_enabled: true,
            haptic_enabled: true,
            push_enabled: true,
        }
    }
}

impl NotificationPreferences {
    pub fn is_category_enabled(&self, category: NotificationCategory) -> bool {
        !self.disabled_categories.contains(&category)
    }

    /// Whether `now` falls inside the configured quiet window.
    pub fn is_quiet(&self, now: Timestamp) -> bool {
        let Some(quiet) = self.quiet_hours else {
            return false;
        };
        let local = now + Duration::minutes(i64::from(self.utc_offset_minutes));
        quiet.contains(local.time())
    }
}

/// What the current platform can do at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub sound: bool,
    pub haptic: bool,
    pub push: bool,
}

impl PlatformCapabilities {
    /// Every channel available.
    pub fn full() -> Self {
        Self {
            sound: true,
            haptic: true,
            push: true,
        }
    }

    /// In-app only (headless, tests).
    pub fn none() -> Self {
        Self {
            sound: false,
            haptic: false,
            push: false,
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::none()
    }
}

/// Native push permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Not asked yet.
    #[default]
    Prompt,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_quiet_hours_wrap_midnight() {
        let quiet = QuietHours::new(at(22, 0), at(7, 0));
        assert!(quiet.contains(at(23, 30)));
        assert!(quiet.contains(at(3, 0)));
        assert!(!quiet.contains(at(7, 0)));
        assert!(!quiet.contains(at(12, 0)));
    }

    #[test]
    fn test_quiet_hours_same_day() {
        let quiet = QuietHours::new(at(12, 0), at(14, 0));
        assert!(quiet.contains(at(12, 0)));
        assert!(!quiet.contains(at(14, 0)));
        assert!(!QuietHours::new(at(9, 0), at(9, 0)).contains(at(9, 0)));
    }

    #[test]
    fn test_is_quiet_uses_local_offset() {
        let prefs = NotificationPreferences {
            quiet_hours: Some(QuietHours::new(at(22, 0), at(7, 0))),
            utc_offset_minutes: 120,
            ..NotificationPreferences::default()
        };
        // 21:00 UTC is 23:00 local
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap();
        assert!(prefs.is_quiet(now));
        let noon = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert!(!prefs.is_quiet(noon));
    }

    #[test]
    fn test_preferences_deserialize_with_defaults() {
        let prefs: NotificationPreferences = serde_json::from_str(
            r#"{"disabled_categories":["promotion"],"sound_enabled":false}"#,
        )
        .unwrap();
        assert!(!prefs.is_category_enabled(NotificationCategory::Promotion));
        assert!(prefs.haptic_enabled);
        assert!(!prefs.sound_enabled);
    }
}
