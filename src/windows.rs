/*
Prayer time-window model.
Pure functions over a day's schedule and a "now", kept free of I/O for testing
*/

use std::collections::BTreeMap;

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::ScheduleError;
use crate::models::Prayer;

// Five start times for one calendar day, strictly increasing, whole minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerSchedule {
    date: NaiveDate,
    times: [NaiveTime; 5],
}

// [start, end) interval during which `name` is the current prayer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrayerWindow {
    pub name: Prayer,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPrayer {
    pub name: Prayer,
    pub time: NaiveDateTime,
}

impl PrayerSchedule {
    pub fn new(date: NaiveDate, times: [NaiveTime; 5]) -> Result<Self, ScheduleError> {
        for pair in Prayer::ALL.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if times[later.index()] <= times[earlier.index()] {
                return Err(ScheduleError::NotIncreasing {
                    earlier,
                    later,
                    later_time: format_hhmm(times[later.index()]),
                });
            }
        }
        Ok(PrayerSchedule { date, times })
    }

    /// Build from the feed's name -> "HH:MM" map. Extra entries (Sunrise, Midnight...) are ignored.
    pub fn from_timings(
        date: NaiveDate,
        timings: &BTreeMap<String, String>,
    ) -> Result<Self, ScheduleError> {
        let mut times = [NaiveTime::MIN; 5];
        for prayer in Prayer::ALL {
            let raw = timings
                .get(prayer.as_str())
                .ok_or(ScheduleError::MissingPrayerTime(prayer))?;
            times[prayer.index()] = parse_hhmm(raw).ok_or_else(|| ScheduleError::InvalidTime {
                prayer,
                value: raw.clone(),
            })?;
        }
        PrayerSchedule::new(date, times)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_of(&self, prayer: Prayer) -> NaiveTime {
        self.times[prayer.index()]
    }

    // The prayer's start time applied to an arbitrary day.
    pub fn start_on(&self, day: NaiveDate, prayer: Prayer) -> NaiveDateTime {
        day.and_time(self.time_of(prayer))
    }

    // Window of `prayer` that starts on `day`. Isha ends at the following day's Fajr.
    pub fn window_on(&self, day: NaiveDate, prayer: Prayer) -> PrayerWindow {
        let next = prayer.next();
        let end_day = if next == Prayer::Fajr { day + Days::new(1) } else { day };
        PrayerWindow {
            name: prayer,
            start: self.start_on(day, prayer),
            end: self.start_on(end_day, next),
        }
    }
}

impl PrayerWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        now >= self.start && now < self.end
    }

    pub fn remaining(&self, now: NaiveDateTime) -> Duration {
        self.end - now
    }

    /// Elapsed fraction of the window, clamped to 0..=1.
    pub fn progress(&self, now: NaiveDateTime) -> f64 {
        let total = (self.end - self.start).num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (now - self.start).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

// Parse "HH:MM" (optionally followed by " (+06)" style suffixes) into a whole-minute time.
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let clean = raw.split_whitespace().next()?;
    let parts: Vec<&str> = clean.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let h: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

// Current prayer window.
//
// Scans today's prayers latest first and takes the first that has started.
// Before today's Fajr we are still inside yesterday's Isha.
pub fn active_window(schedule: &PrayerSchedule, now: NaiveDateTime) -> PrayerWindow {
    let today = now.date();
    for prayer in Prayer::ALL.into_iter().rev() {
        if now >= schedule.start_on(today, prayer) {
            return schedule.window_on(today, prayer);
        }
    }
    schedule.window_on(today - Days::new(1), Prayer::Isha)
}

// First prayer starting strictly after now; tomorrow's Fajr once Isha has begun.
pub fn next_window(schedule: &PrayerSchedule, now: NaiveDateTime) -> NextPrayer {
    let today = now.date();
    Prayer::ALL
        .into_iter()
        .map(|name| NextPrayer {
            name,
            time: schedule.start_on(today, name),
        })
        .find(|next| next.time > now)
        .unwrap_or_else(|| NextPrayer {
            name: Prayer::Fajr,
            time: schedule.start_on(today + Days::new(1), Prayer::Fajr),
        })
}

pub fn window_start(prayer: Prayer, schedule: &PrayerSchedule) -> NaiveDateTime {
    schedule.start_on(schedule.date(), prayer)
}

// End boundary of `prayer` on the schedule's own day, independent of now.
pub fn window_end(prayer: Prayer, schedule: &PrayerSchedule) -> NaiveDateTime {
    schedule.window_on(schedule.date(), prayer).end
}
