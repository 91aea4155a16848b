/*
Display helpers.
Countdown and clock formatting, Hijri adjustment, and the "today" view model
consumed by the front-end.
*/

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::i18n::{localize_digits, prayer_name, HIJRI_MONTHS_BN};
use crate::models::{HijriDate, Language, Location, Prayer};
use crate::windows::{active_window, next_window, PrayerSchedule};

// "HH:MM:SS"; anything already past shows as zero.
pub fn format_countdown(remaining: Duration, lang: Language) -> String {
    let total = remaining.num_seconds().max(0);
    let text = format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    );
    localize_digits(lang, &text)
}

// "M:SS" for the alert banner.
pub fn format_alert_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds();
    if total <= 0 {
        return "0:00".to_string();
    }
    format!("{}:{:02}", total / 60, total % 60)
}

// "07:05 PM"; Bengali drops AM/PM and localizes digits.
pub fn format_time_12h(t: NaiveTime, lang: Language) -> String {
    match lang {
        Language::En => t.format("%I:%M %p").to_string(),
        Language::Bn => localize_digits(lang, &t.format("%I:%M").to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedHijri {
    pub day: u32,
    pub month: u32,
    pub year: i64,
}

// Shift the Hijri date by `adjustment` days using 30-day months.
// Only a single month of overflow is handled, matching the +/- few days the setting is for.
pub fn adjust_hijri(hijri: &HijriDate, adjustment: i64) -> Option<AdjustedHijri> {
    let mut day: i64 = hijri.day.trim().parse().ok()?;
    let mut month = i64::from(hijri.month.number);
    let mut year: i64 = hijri.year.trim().parse().ok()?;

    day += adjustment;
    if day > 30 {
        day -= 30;
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    } else if day < 1 {
        day += 30;
        month -= 1;
        if month < 1 {
            month = 12;
            year -= 1;
        }
    }

    Some(AdjustedHijri {
        day: day.clamp(1, 30) as u32,
        month: month as u32,
        year,
    })
}

pub fn format_hijri(hijri: &HijriDate, adjustment: i64, lang: Language) -> Option<String> {
    let adjusted = adjust_hijri(hijri, adjustment)?;
    let month_name = match lang {
        Language::Bn => HIJRI_MONTHS_BN
            .get((adjusted.month as usize).wrapping_sub(1))
            .copied()
            .unwrap_or(hijri.month.en.as_str()),
        Language::En => hijri.month.en.as_str(),
    };
    Some(format!(
        "{} {} {} AH",
        localize_digits(lang, &adjusted.day.to_string()),
        month_name,
        localize_digits(lang, &adjusted.year.to_string())
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Current,
    Passed,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrayerRow {
    pub prayer: Prayer,
    pub label: &'static str,
    pub icon: &'static str,
    pub start: String,
    pub end: String,
    pub status: RowStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentCard {
    pub prayer: Prayer,
    pub label: &'static str,
    pub icon: &'static str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub started_at: String,
    pub countdown: String,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextCard {
    pub prayer: Prayer,
    pub label: &'static str,
    pub time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodayView {
    pub location: String,
    pub gregorian: String,
    pub hijri: Option<String>,
    pub current: CurrentCard,
    pub next: NextCard,
    pub rows: Vec<PrayerRow>,
    pub sehri_ends: String,
    pub iftar: String,
}

pub fn today_view(
    schedule: &PrayerSchedule,
    location: &Location,
    hijri: Option<&HijriDate>,
    adjustment: i64,
    now: NaiveDateTime,
    lang: Language,
) -> TodayView {
    let current = active_window(schedule, now);
    let next = next_window(schedule, now);
    let today = now.date();

    let rows = Prayer::ALL
        .into_iter()
        .map(|prayer| {
            let window = schedule.window_on(today, prayer);
            let status = if prayer == current.name {
                RowStatus::Current
            } else if window.start < now {
                RowStatus::Passed
            } else {
                RowStatus::Upcoming
            };
            PrayerRow {
                prayer,
                label: prayer_name(lang, prayer),
                icon: prayer.icon(),
                start: format_time_12h(window.start.time(), lang),
                end: format_time_12h(window.end.time(), lang),
                status,
            }
        })
        .collect();

    let started = format_time_12h(current.start.time(), lang);
    let started_at = match lang {
        Language::En => format!("Started at {started}"),
        Language::Bn => format!("{started}-এ শুরু হয়েছে"),
    };

    TodayView {
        location: format!("{}, {}", location.city, location.country),
        gregorian: localize_digits(lang, &today.format("%A, %-d %B %Y").to_string()),
        hijri: hijri.and_then(|h| format_hijri(h, adjustment, lang)),
        current: CurrentCard {
            prayer: current.name,
            label: prayer_name(lang, current.name),
            icon: current.name.icon(),
            start: current.start,
            end: current.end,
            started_at,
            countdown: format_countdown(current.remaining(now), lang),
            progress_percent: current.progress(now) * 100.0,
        },
        next: NextCard {
            prayer: next.name,
            label: prayer_name(lang, next.name),
            time: next.time,
        },
        rows,
        sehri_ends: format_time_12h(schedule.time_of(Prayer::Fajr), lang),
        iftar: format_time_12h(schedule.time_of(Prayer::Maghrib), lang),
    }
}
