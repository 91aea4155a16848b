/*
Trigger evaluation.
Decides, for one instant, whether the prayer alert should be visible.
*/

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Prayer;
use crate::settings::NotificationSettings;
use crate::windows::{active_window, PrayerSchedule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    // alert open, counting down to the sub-window end
    Show { prayer: Prayer, until: NaiveDateTime },
    Hide,
    NoChange,
}

// A single occurrence of a prayer window: the name plus the instant it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occurrence {
    prayer: Prayer,
    start: NaiveDateTime,
}

/// One-shot suppression of the alert for the current prayer occurrence. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct DismissalState {
    dismissed_for: Option<Prayer>,
    last_active: Option<Occurrence>,
}

impl DismissalState {
    pub fn dismissed_for(&self) -> Option<Prayer> {
        self.dismissed_for
    }

    // Suppress the alert for whatever prayer is active at `now`.
    pub fn dismiss(&mut self, schedule: &PrayerSchedule, now: NaiveDateTime) -> Prayer {
        let active = active_window(schedule, now);
        self.last_active = Some(Occurrence {
            prayer: active.name,
            start: active.start,
        });
        self.dismissed_for = Some(active.name);
        active.name
    }

    fn observe(&mut self, current: Occurrence) {
        if self.last_active != Some(current) {
            if let Some(prayer) = self.dismissed_for.take() {
                log::debug!("dismissal for {prayer} expired, {} is now active", current.prayer);
            }
            self.last_active = Some(current);
        }
    }
}

// Evaluate the alert state at `now`.
//
// 1) find the active prayer window; a new occurrence clears any dismissal
// 2) a dismissed occurrence stays untouched
// 3) without both sub-window bounds for the active prayer, hide
// 4) show while now is inside the sub-window (anchored to today) and the prayer window
pub fn evaluate(
    schedule: &PrayerSchedule,
    settings: &NotificationSettings,
    now: NaiveDateTime,
    dismissal: &mut DismissalState,
) -> Decision {
    let active = active_window(schedule, now);
    dismissal.observe(Occurrence {
        prayer: active.name,
        start: active.start,
    });

    if !settings.enabled {
        return Decision::Hide;
    }

    if dismissal.dismissed_for == Some(active.name) {
        return Decision::NoChange;
    }

    let Some((start, end)) = settings.sub_window(active.name).bounds() else {
        return Decision::Hide;
    };

    let today = now.date();
    let (start, end) = (today.and_time(start), today.and_time(end));

    if now >= start && now < end && active.contains(now) {
        Decision::Show {
            prayer: active.name,
            until: end,
        }
    } else {
        Decision::Hide
    }
}
