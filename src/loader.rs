// --------------------------------------------------
// Loads prayer schedules for the saved location.
//
// Responsibilities:
// - Same-day cache keyed by (city, country, date)
// - Fetch on miss, build a PrayerSchedule, hand it to the scheduler
// - Keep the last schedule when the network is unavailable
// - Reload on local date rollover
// - Monthly calendar with its own cache
// --------------------------------------------------

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use tokio::time::Duration;

use crate::error::AppError;
use crate::models::{DayTimings, Location, Prayer};
use crate::preferences::{calc_settings, location_or_fallback};
use crate::settings;
use crate::state::{AppState, LoadedDay};
use crate::store::{CACHE_KEY, CALENDAR_CACHE_KEY};
use crate::windows::PrayerSchedule;

const ROLLOVER_CHECK_S: u64 = 60;

pub fn cache_key(location: &Location, date: NaiveDate) -> String {
    format!(
        "{CACHE_KEY}_{}_{}_{}",
        location.city,
        location.country,
        date.format("%Y-%m-%d")
    )
}

pub fn calendar_cache_key(year: i32, month: u32, location: &Location) -> String {
    format!(
        "{CALENDAR_CACHE_KEY}_{year}_{month}_{}_{}",
        location.city, location.country
    )
}

fn cached<T: serde::de::DeserializeOwned>(state: &AppState, key: &str) -> Option<T> {
    let text = state.store.get(key)?;
    serde_json::from_str(&text)
        .inspect_err(|e| warn!("discarding unreadable cache entry {key}: {e}"))
        .ok()
}

fn remember<T: Serialize>(state: &AppState, key: &str, value: &T) {
    let written = serde_json::to_string(value)
        .map_err(crate::error::StoreError::from)
        .and_then(|text| state.store.set(key, text));
    if let Err(e) = written {
        warn!("failed to cache {key}: {e}");
    }
}

async fn day_timings(
    state: &AppState,
    location: &Location,
    date: NaiveDate,
) -> Result<DayTimings, AppError> {
    let key = cache_key(location, date);
    if let Some(day) = cached::<DayTimings>(state, &key) {
        return Ok(day);
    }

    let calc = calc_settings(state.store.as_ref());
    match state.client.timings_by_city(location, &calc).await {
        Ok(day) => {
            remember(state, &key, &day);
            Ok(day)
        }
        Err(e) => {
            warn!("prayer times unavailable for {}, {}: {e}", location.city, location.country);
            Err(AppError::Unavailable("prayer times unavailable".to_string()))
        }
    }
}

/// Load today's schedule and push it to the scheduler. On failure the previous day stays.
pub async fn load_today(state: &AppState) -> Result<LoadedDay, AppError> {
    let location = location_or_fallback(state.store.as_ref());
    let today = state.clock.now().date();

    let timings = day_timings(state, &location, today).await?;
    let schedule = PrayerSchedule::from_timings(today, &timings.timings).map_err(|e| {
        warn!("rejecting schedule for {today}: {e}");
        AppError::Unavailable(e.to_string())
    })?;

    // Saved sub-windows are not rewritten here, only reported.
    let (_, stale) = settings::validate(&settings::load(state.store.as_ref()), &schedule);
    if !stale.is_empty() {
        warn!("saved notification windows no longer fit today's schedule: {stale:?}");
    }

    let loaded = LoadedDay {
        location,
        timings,
        schedule: schedule.clone(),
    };
    *state.today.write().await = Some(loaded.clone());
    state.scheduler.schedule_loaded(schedule).await;

    info!("loaded prayer times for {} ({})", loaded.location.city, today);
    Ok(loaded)
}

// Current day if loaded, otherwise try loading it now.
pub async fn current_day(state: &AppState) -> Result<LoadedDay, AppError> {
    if let Some(day) = state.today.read().await.clone() {
        return Ok(day);
    }
    load_today(state).await
}

// Reload whenever the local date moves past the loaded schedule's date.
pub async fn rollover_loop(state: AppState) {
    loop {
        tokio::time::sleep(Duration::from_secs(ROLLOVER_CHECK_S)).await;

        let loaded_date = state.today.read().await.as_ref().map(|d| d.schedule.date());
        let today = state.clock.now().date();
        if loaded_date != Some(today) {
            if let Err(e) = load_today(&state).await {
                warn!("rollover reload failed, keeping previous schedule: {e}");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub times: Vec<(Prayer, String)>,
}

// Month as (day, [(prayer, "HH:MM")]) rows, fetched once per location and month.
pub async fn month_calendar(
    state: &AppState,
    year: i32,
    month: u32,
) -> Result<Vec<CalendarDay>, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest("month must be 1..=12".to_string()));
    }

    let location = location_or_fallback(state.store.as_ref());
    let key = calendar_cache_key(year, month, &location);

    let days = match cached::<Vec<DayTimings>>(state, &key) {
        Some(days) => days,
        None => {
            let calc = calc_settings(state.store.as_ref());
            let days = state
                .client
                .calendar_by_city(year, month, &location, &calc)
                .await
                .map_err(|e| {
                    warn!("calendar unavailable for {year}-{month}: {e}");
                    AppError::Unavailable("calendar unavailable".to_string())
                })?;
            remember(state, &key, &days);
            days
        }
    };

    Ok(days
        .iter()
        .enumerate()
        .map(|(i, day)| CalendarDay {
            day: i as u32 + 1,
            times: Prayer::ALL
                .into_iter()
                .map(|p| {
                    let raw = day.timings.get(p.as_str()).map(String::as_str).unwrap_or("");
                    (p, raw.split_whitespace().next().unwrap_or("").to_string())
                })
                .collect(),
        })
        .collect())
}

// Month navigation with year wrap.
pub fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + offset;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
