// --------------------------------------------------
// Notification settings: per-prayer alert sub-windows
// plus the global enable flag.
//
// Responsibilities:
// - Forward-compatible load (merge stored fields over defaults)
// - Validate sub-windows against the day's prayer windows
// - Persist validated settings
// --------------------------------------------------

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;
use crate::models::Prayer;
use crate::store::{KvStore, NOTIFICATION_KEY};
use crate::windows::{format_hhmm, parse_hhmm, window_end, window_start, PrayerSchedule};

// User-chosen alert range inside one prayer window. Stored as "HH:MM" or "".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubWindow {
    #[serde(with = "clock_field", default)]
    pub start: Option<NaiveTime>,
    #[serde(with = "clock_field", default)]
    pub end: Option<NaiveTime>,
}

impl SubWindow {
    #[cfg(test)]
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        SubWindow {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    // Only a fully specified range can trigger an alert.
    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub prayers: BTreeMap<Prayer, SubWindow>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            prayers: Prayer::ALL
                .into_iter()
                .map(|p| (p, SubWindow::default()))
                .collect(),
        }
    }
}

impl NotificationSettings {
    pub fn sub_window(&self, prayer: Prayer) -> SubWindow {
        self.prayers.get(&prayer).copied().unwrap_or_default()
    }

    pub fn any_configured(&self) -> bool {
        Prayer::ALL
            .into_iter()
            .any(|p| self.sub_window(p).bounds().is_some())
    }
}

// Loose persisted shape: every field optional so older or partial data still reads.
#[derive(Deserialize)]
struct StoredSettings {
    enabled: Option<bool>,
    prayers: Option<BTreeMap<String, Option<StoredSubWindow>>>,
}

#[derive(Deserialize)]
struct StoredSubWindow {
    start: Option<String>,
    end: Option<String>,
}

fn lenient_time(raw: Option<&str>) -> Option<NaiveTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_hhmm(raw);
    if parsed.is_none() {
        log::warn!("ignoring unreadable notification time '{raw}'");
    }
    parsed
}

/// Read settings, falling back to defaults field by field; never fails.
pub fn load(store: &dyn KvStore) -> NotificationSettings {
    let mut settings = NotificationSettings::default();

    let Some(text) = store.get(NOTIFICATION_KEY) else {
        return settings;
    };

    let stored: StoredSettings = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to parse notification settings: {e}");
            return settings;
        }
    };

    if let Some(enabled) = stored.enabled {
        settings.enabled = enabled;
    }

    let stored_prayers = stored.prayers.unwrap_or_default();
    for prayer in Prayer::ALL {
        if let Some(Some(sw)) = stored_prayers.get(prayer.as_str()) {
            settings.prayers.insert(
                prayer,
                SubWindow {
                    start: lenient_time(sw.start.as_deref()),
                    end: lenient_time(sw.end.as_deref()),
                },
            );
        }
    }

    settings
}

pub fn save(store: &dyn KvStore, settings: &NotificationSettings) -> Result<(), StoreError> {
    let text = serde_json::to_string(settings)?;
    store.set(NOTIFICATION_KEY, text)
}

// Clock-time membership in [start, end]. A window that crosses midnight
// (Isha -> next Fajr) wraps around 00:00.
fn within(t: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= t && t <= end
    } else {
        t >= start || t <= end
    }
}

// Check every configured sub-window against the schedule.
//
// Rules per prayer with a start or end set:
// - each set value lies inside [window start, window end] (clock time)
// - start <= end when both are set
// Offending prayers get both fields cleared in the returned copy.
pub fn validate(
    candidate: &NotificationSettings,
    schedule: &PrayerSchedule,
) -> (NotificationSettings, Vec<Prayer>) {
    let mut cleaned = candidate.clone();
    let mut invalid = Vec::new();

    for prayer in Prayer::ALL {
        let sw = candidate.sub_window(prayer);
        if sw.is_empty() {
            cleaned.prayers.insert(prayer, sw);
            continue;
        }

        let open = window_start(prayer, schedule).time();
        let close = window_end(prayer, schedule).time();
        let in_window = |t: Option<NaiveTime>| t.is_none_or(|t| within(t, open, close));

        let ordered = match sw.bounds() {
            Some((start, end)) => start <= end,
            None => true,
        };

        if in_window(sw.start) && in_window(sw.end) && ordered {
            cleaned.prayers.insert(prayer, sw);
        } else {
            log::debug!(
                "rejecting {prayer} sub-window {:?}-{:?} (window {}-{})",
                sw.start,
                sw.end,
                format_hhmm(open),
                format_hhmm(close)
            );
            cleaned.prayers.insert(prayer, SubWindow::default());
            invalid.push(prayer);
        }
    }

    (cleaned, invalid)
}

mod clock_field {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&format_hhmm(*t)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_hhmm(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{text}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::windows::tests::sample_schedule;

    fn t(s: &str) -> NaiveTime {
        parse_hhmm(s).unwrap()
    }

    fn with(prayer: Prayer, sw: SubWindow) -> NotificationSettings {
        let mut s = NotificationSettings::default();
        s.prayers.insert(prayer, sw);
        s
    }

    #[test]
    fn absent_key_loads_defaults() {
        let store = MemoryStore::default();
        let s = load(&store);
        assert!(s.enabled);
        assert_eq!(s.prayers.len(), 5);
        assert!(!s.any_configured());
    }

    #[test]
    fn corrupt_json_loads_defaults() {
        let store = MemoryStore::default();
        store.set(NOTIFICATION_KEY, "{oops".into()).unwrap();
        assert_eq!(load(&store), NotificationSettings::default());
    }

    #[test]
    fn partial_shape_merges_with_defaults() {
        let store = MemoryStore::default();
        store
            .set(
                NOTIFICATION_KEY,
                r#"{"prayers":{"Asr":{"start":"15:50"},"Isha":null,"Witr":{"start":"01:00"}}}"#.into(),
            )
            .unwrap();

        let s = load(&store);
        assert!(s.enabled);
        assert_eq!(s.sub_window(Prayer::Asr).start, Some(t("15:50")));
        assert_eq!(s.sub_window(Prayer::Asr).end, None);
        assert!(s.sub_window(Prayer::Isha).is_empty());
        assert_eq!(s.prayers.len(), 5);
    }

    #[test]
    fn disabled_flag_is_respected() {
        let store = MemoryStore::default();
        store.set(NOTIFICATION_KEY, r#"{"enabled":false}"#.into()).unwrap();
        assert!(!load(&store).enabled);
    }

    #[test]
    fn sub_window_inside_prayer_window_is_valid() {
        let s = with(Prayer::Asr, SubWindow::new(t("15:50"), t("16:00")));
        let (cleaned, invalid) = validate(&s, &sample_schedule());
        assert!(invalid.is_empty());
        assert_eq!(cleaned, s);
    }

    #[test]
    fn sub_window_outside_window_is_cleared() {
        let s = with(Prayer::Asr, SubWindow::new(t("15:00"), t("16:00")));
        let (cleaned, invalid) = validate(&s, &sample_schedule());
        assert_eq!(invalid, vec![Prayer::Asr]);
        assert!(cleaned.sub_window(Prayer::Asr).is_empty());
    }

    #[test]
    fn reversed_sub_window_is_invalid() {
        let s = with(Prayer::Dhuhr, SubWindow::new(t("13:00"), t("12:30")));
        let (_, invalid) = validate(&s, &sample_schedule());
        assert_eq!(invalid, vec![Prayer::Dhuhr]);
    }

    #[test]
    fn window_end_is_inclusive_for_validation() {
        let s = with(Prayer::Dhuhr, SubWindow::new(t("12:10"), t("15:45")));
        let (_, invalid) = validate(&s, &sample_schedule());
        assert!(invalid.is_empty());
    }

    #[test]
    fn half_filled_sub_window_is_checked_too() {
        let mut sw = SubWindow::default();
        sw.end = Some(t("09:00"));
        let (_, invalid) = validate(&with(Prayer::Maghrib, sw), &sample_schedule());
        assert_eq!(invalid, vec![Prayer::Maghrib]);
    }

    #[test]
    fn isha_window_wraps_past_midnight() {
        let schedule = sample_schedule();
        let late = with(Prayer::Isha, SubWindow::new(t("22:00"), t("23:30")));
        let early = with(Prayer::Isha, SubWindow::new(t("04:00"), t("04:30")));
        let morning = with(Prayer::Isha, SubWindow::new(t("06:00"), t("06:30")));

        assert!(validate(&late, &schedule).1.is_empty());
        assert!(validate(&early, &schedule).1.is_empty());
        assert_eq!(validate(&morning, &schedule).1, vec![Prayer::Isha]);
    }

    #[test]
    fn validate_is_idempotent() {
        let mut s = with(Prayer::Asr, SubWindow::new(t("15:50"), t("16:00")));
        s.prayers.insert(Prayer::Fajr, SubWindow::new(t("03:00"), t("04:00")));
        let schedule = sample_schedule();

        let (once, invalid) = validate(&s, &schedule);
        assert_eq!(invalid, vec![Prayer::Fajr]);
        let (twice, invalid_again) = validate(&once, &schedule);
        assert!(invalid_again.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn save_then_load_round_trips_cleaned_settings() {
        let store = MemoryStore::default();
        let mut s = with(Prayer::Asr, SubWindow::new(t("15:50"), t("16:00")));
        s.enabled = false;
        let (cleaned, _) = validate(&s, &sample_schedule());

        save(&store, &cleaned).unwrap();
        assert_eq!(load(&store), cleaned);

        let raw = store.get(NOTIFICATION_KEY).unwrap();
        assert!(raw.contains(r#""Asr":{"start":"15:50","end":"16:00"}"#));
        assert!(raw.contains(r#""Fajr":{"start":"","end":""}"#));
    }
}
