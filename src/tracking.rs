/*
Prayer completion log and the statistics derived from it.
Log shape: { "YYYY-MM-DD": { "Fajr": true, ... }, ... }
*/

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::StoreError;
use crate::models::Prayer;
use crate::store::{KvStore, PRAYER_LOG_KEY};

pub type DayLog = BTreeMap<Prayer, bool>;
pub type PrayerLog = BTreeMap<String, DayLog>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStat {
    pub date: String,
    pub day_name: String,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub current_streak: u32,
    pub best_streak: u32,
    pub today_count: usize,
    pub weekly: Vec<DayStat>,
    pub monthly_count: usize,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn load_log(store: &dyn KvStore) -> PrayerLog {
    let Some(text) = store.get(PRAYER_LOG_KEY) else {
        return PrayerLog::new();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        log::warn!("prayer log unreadable, starting fresh: {e}");
        PrayerLog::new()
    })
}

fn save_log(store: &dyn KvStore, log: &PrayerLog) -> Result<(), StoreError> {
    store.set(PRAYER_LOG_KEY, serde_json::to_string(log)?)
}

/// Flip one prayer for `date`; returns the new completion state.
pub fn toggle(store: &dyn KvStore, date: NaiveDate, prayer: Prayer) -> Result<bool, StoreError> {
    let mut log = load_log(store);
    let day = log.entry(date_key(date)).or_default();
    let done = !day.get(&prayer).copied().unwrap_or(false);
    day.insert(prayer, done);
    save_log(store, &log)?;
    Ok(done)
}

pub fn reset(store: &dyn KvStore) -> Result<(), StoreError> {
    store.remove(PRAYER_LOG_KEY)
}

pub fn day_log(log: &PrayerLog, date: NaiveDate) -> DayLog {
    let recorded = log.get(&date_key(date));
    Prayer::ALL
        .into_iter()
        .map(|p| (p, recorded.and_then(|d| d.get(&p)).copied().unwrap_or(false)))
        .collect()
}

fn completed(day: &DayLog) -> usize {
    Prayer::ALL
        .into_iter()
        .filter(|p| day.get(p).copied().unwrap_or(false))
        .count()
}

// Streaks of fully completed days.
//
// Walk logged dates newest first. A full day extends the running streak,
// anything else resets it. The running streak counts as "current" only while
// every i-th newest logged date so far is exactly today - i and full.
pub fn streaks(log: &PrayerLog, today: NaiveDate) -> (u32, u32) {
    let mut current = 0;
    let mut best = 0;
    let mut running = 0;
    let mut unbroken = true;

    let dated = log
        .iter()
        .rev()
        .filter_map(|(key, day)| Some((NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?, day)));

    for (i, (date, day)) in dated.enumerate() {
        if today.checked_sub_days(Days::new(i as u64)) != Some(date) {
            unbroken = false;
        }
        if completed(day) == Prayer::ALL.len() {
            running += 1;
            if unbroken {
                current = running;
            }
        } else {
            running = 0;
            unbroken = false;
        }
        best = best.max(running);
    }

    (current, best)
}

// Last seven days, oldest first.
pub fn weekly(log: &PrayerLog, today: NaiveDate) -> Vec<DayStat> {
    (0..7u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| DayStat {
            date: date_key(date),
            day_name: date.format("%a").to_string(),
            completed: completed(&day_log(log, date)),
        })
        .collect()
}

pub fn monthly_count(log: &PrayerLog, today: NaiveDate) -> usize {
    log.iter()
        .filter_map(|(key, day)| Some((NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?, day)))
        .filter(|(date, _)| date.year() == today.year() && date.month() == today.month())
        .map(|(_, day)| completed(day))
        .sum()
}

pub fn stats(log: &PrayerLog, today: NaiveDate) -> Stats {
    let (current_streak, best_streak) = streaks(log, today);
    Stats {
        current_streak,
        best_streak,
        today_count: completed(&day_log(log, today)),
        weekly: weekly(log, today),
        monthly_count: monthly_count(log, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn full_day() -> DayLog {
        Prayer::ALL.into_iter().map(|p| (p, true)).collect()
    }

    fn log_of(days: &[(&str, DayLog)]) -> PrayerLog {
        days.iter().map(|(k, d)| (k.to_string(), d.clone())).collect()
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = MemoryStore::default();
        let today = date("2026-03-10");

        assert!(toggle(&store, today, Prayer::Asr).unwrap());
        assert!(day_log(&load_log(&store), today)[&Prayer::Asr]);
        assert!(!toggle(&store, today, Prayer::Asr).unwrap());
        assert!(!day_log(&load_log(&store), today)[&Prayer::Asr]);
    }

    #[test]
    fn reset_clears_everything() {
        let store = MemoryStore::default();
        toggle(&store, date("2026-03-10"), Prayer::Fajr).unwrap();
        reset(&store).unwrap();
        assert!(load_log(&store).is_empty());
    }

    #[test]
    fn consecutive_full_days_count_as_current_streak() {
        let log = log_of(&[
            ("2026-03-08", full_day()),
            ("2026-03-09", full_day()),
            ("2026-03-10", full_day()),
        ]);
        assert_eq!(streaks(&log, date("2026-03-10")), (3, 3));
    }

    #[test]
    fn partial_day_breaks_the_streak() {
        let mut partial = full_day();
        partial.insert(Prayer::Isha, false);
        let log = log_of(&[
            ("2026-03-05", full_day()),
            ("2026-03-06", full_day()),
            ("2026-03-07", full_day()),
            ("2026-03-08", partial),
            ("2026-03-09", full_day()),
            ("2026-03-10", full_day()),
        ]);
        assert_eq!(streaks(&log, date("2026-03-10")), (2, 3));
    }

    #[test]
    fn stale_streak_is_not_current() {
        let log = log_of(&[("2026-03-01", full_day()), ("2026-03-02", full_day())]);
        assert_eq!(streaks(&log, date("2026-03-10")), (0, 2));
    }

    #[test]
    fn weekly_is_oldest_first_with_counts() {
        let mut two = DayLog::new();
        two.insert(Prayer::Fajr, true);
        two.insert(Prayer::Dhuhr, true);
        let log = log_of(&[("2026-03-10", two), ("2026-03-04", full_day())]);

        let week = weekly(&log, date("2026-03-10"));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, "2026-03-04");
        assert_eq!(week[0].completed, 5);
        assert_eq!(week[6].date, "2026-03-10");
        assert_eq!(week[6].day_name, "Tue");
        assert_eq!(week[6].completed, 2);
    }

    #[test]
    fn monthly_count_only_sums_this_month() {
        let log = log_of(&[
            ("2026-02-28", full_day()),
            ("2026-03-01", full_day()),
            ("2026-03-10", full_day()),
        ]);
        let s = stats(&log, date("2026-03-10"));
        assert_eq!(s.monthly_count, 10);
        assert_eq!(s.today_count, 5);
    }
}
