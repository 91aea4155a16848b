// --------------------------------------------------
// Handles API endpoints for the prayer completion log.
//
// Responsibilities:
// - Toggle a prayer as done / not done for today
// - Today's log
// - Streaks, weekly and monthly statistics
// - Reset
// --------------------------------------------------

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::models::Prayer;
use crate::state::AppState;
use crate::tracking::{self, DayLog, Stats};

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub date: String,
    pub prayer: Prayer,
    pub completed: bool,
}

// -----------------------------
// POST /api/log/:prayer/toggle
// -----------------------------
pub async fn toggle_prayer(
    State(state): State<AppState>,
    Path(prayer): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let prayer: Prayer = prayer.parse().map_err(AppError::NotFound)?;
    let today = state.clock.now().date();

    let completed = tracking::toggle(state.store.as_ref(), today, prayer)?;
    log::debug!("{prayer} on {today} marked {}", if completed { "done" } else { "not done" });

    Ok(Json(ToggleResponse {
        date: tracking::date_key(today),
        prayer,
        completed,
    }))
}

// -----------------------------
// GET /api/log/today
// All five prayers, missing entries as false
// -----------------------------
pub async fn get_today_log(State(state): State<AppState>) -> Json<DayLog> {
    let log = tracking::load_log(state.store.as_ref());
    Json(tracking::day_log(&log, state.clock.now().date()))
}

// -----------------------------
// GET /api/stats
// -----------------------------
pub async fn get_stats(State(state): State<AppState>) -> Json<Stats> {
    let log = tracking::load_log(state.store.as_ref());
    Json(tracking::stats(&log, state.clock.now().date()))
}

// -----------------------------
// DELETE /api/stats
// -----------------------------
pub async fn reset_stats(State(state): State<AppState>) -> impl IntoResponse {
    match tracking::reset(state.store.as_ref()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::test_state;

    #[tokio::test]
    async fn toggle_then_read_back() {
        let server = mockito::Server::new_async().await;
        let state = test_state(&server.url(), "21:00");

        let Json(resp) = toggle_prayer(State(state.clone()), Path("isha".to_string()))
            .await
            .unwrap();
        assert!(resp.completed);
        assert_eq!(resp.date, "2026-03-10");

        let Json(day) = get_today_log(State(state.clone())).await;
        assert!(day[&Prayer::Isha]);
        assert!(!day[&Prayer::Fajr]);

        let Json(stats) = get_stats(State(state.clone())).await;
        assert_eq!(stats.today_count, 1);

        let resp = reset_stats(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let Json(stats) = get_stats(State(state)).await;
        assert_eq!(stats.today_count, 0);
    }

    #[tokio::test]
    async fn unknown_prayer_is_404() {
        let server = mockito::Server::new_async().await;
        let state = test_state(&server.url(), "21:00");

        let err = toggle_prayer(State(state), Path("sunrise".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
