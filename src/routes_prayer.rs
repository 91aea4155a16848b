// --------------------------------------------------
// Handles API endpoints for the day's prayer times.
//
// Responsibilities:
// - Today view (rows, current window, next prayer, dates)
// - Forced reload of today's schedule
// - Monthly calendar
// - Random Quran verse
// --------------------------------------------------

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::display::{today_view, TodayView};
use crate::error::AppError;
use crate::loader::{self, CalendarDay};
use crate::models::Ayah;
use crate::preferences;
use crate::state::{AppState, LoadedDay};

fn view_of(state: &AppState, day: &LoadedDay) -> TodayView {
    let store = state.store.as_ref();
    today_view(
        &day.schedule,
        &day.location,
        day.timings.date.hijri.as_ref(),
        preferences::calc_settings(store).adjustment,
        state.clock.now(),
        preferences::language(store),
    )
}

// -----------------------------
// GET /api/today
// Today's schedule rendered for the saved language
// -----------------------------
pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodayView>, AppError> {
    let day = loader::current_day(&state).await?;
    Ok(Json(view_of(&state, &day)))
}

// -----------------------------
// POST /api/today/refresh
// Reload from cache or network and re-arm the scheduler
// -----------------------------
pub async fn refresh_today(State(state): State<AppState>) -> Result<Json<TodayView>, AppError> {
    let day = loader::load_today(&state).await?;
    Ok(Json(view_of(&state, &day)))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    // months to move from (year, month), e.g. -1 for "previous"
    pub offset: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

// -----------------------------
// GET /api/calendar?year=2026&month=3
// Defaults to the current month
// -----------------------------
pub async fn get_calendar(
    State(state): State<AppState>,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = state.clock.now().date();
    let (year, month) = loader::shift_month(
        q.year.unwrap_or(today.year()),
        q.month.unwrap_or(today.month()),
        q.offset.unwrap_or(0),
    );

    let days = loader::month_calendar(&state, year, month).await?;
    Ok(Json(CalendarResponse { year, month, days }))
}

// -----------------------------
// GET /api/ayah
// -----------------------------
pub async fn get_ayah(State(state): State<AppState>) -> impl IntoResponse {
    let lang = preferences::language(state.store.as_ref());
    match state.client.random_ayah(lang).await {
        Ok(ayah) => Json::<Ayah>(ayah).into_response(),
        Err(e) => {
            log::warn!("verse unavailable: {e}");
            AppError::Unavailable("verse unavailable".to_string()).into_response()
        }
    }
}
