// --------------------------------------------------
// Handles API endpoints for user preferences and the
// notification alert.
//
// Responsibilities:
// - Location (manual and detected from coordinates)
// - Calculation settings and language
// - Notification sub-windows (validated against today's schedule)
// - Current alert and dismissal
// --------------------------------------------------

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::display::format_alert_countdown;
use crate::error::AppError;
use crate::i18n::{self, MessageId};
use crate::loader;
use crate::models::{CalcSettings, Language, Location, Prayer};
use crate::preferences;
use crate::scheduler::SchedulerState;
use crate::settings::{self, NotificationSettings};
use crate::state::AppState;

// Saving a preference that changes the schedule reloads it; a failed reload
// keeps the saved value and the previous schedule.
async fn reload_after_change(state: &AppState) {
    if let Err(e) = loader::load_today(state).await {
        log::warn!("reload after preference change failed: {e}");
    }
}

// -----------------------------
// GET /api/location
// -----------------------------
pub async fn get_location(State(state): State<AppState>) -> Json<Location> {
    Json(preferences::location_or_fallback(state.store.as_ref()))
}

#[derive(Debug, Deserialize)]
pub struct LocationInput {
    pub city: String,
    pub country: String,
}

// -----------------------------
// PUT /api/location
// Both fields required after trimming
// -----------------------------
pub async fn put_location(
    State(state): State<AppState>,
    Json(input): Json<LocationInput>,
) -> Result<Json<Location>, AppError> {
    let store = state.store.as_ref();
    let Some(location) = preferences::clean_location(&input.city, &input.country) else {
        let lang = preferences::language(store);
        return Err(AppError::BadRequest(
            i18n::text(lang, MessageId::LocationRequired).to_string(),
        ));
    };

    preferences::save_location(store, &location)?;
    reload_after_change(&state).await;
    Ok(Json(location))
}

#[derive(Debug, Deserialize)]
pub struct DetectInput {
    pub latitude: f64,
    pub longitude: f64,
}

// -----------------------------
// POST /api/location/detect
// Reverse-geocode coordinates; falls back to the default location
// -----------------------------
pub async fn detect_location(
    State(state): State<AppState>,
    Json(input): Json<DetectInput>,
) -> Result<Json<Location>, AppError> {
    if !(-90.0..=90.0).contains(&input.latitude) || !(-180.0..=180.0).contains(&input.longitude) {
        return Err(AppError::BadRequest("coordinates out of range".to_string()));
    }

    let location = match state.client.reverse_geocode(input.latitude, input.longitude).await {
        Ok(location) => location,
        Err(e) => {
            log::warn!("reverse geocoding failed, using default location: {e}");
            Location::fallback()
        }
    };

    preferences::save_location(state.store.as_ref(), &location)?;
    reload_after_change(&state).await;
    Ok(Json(location))
}

// -----------------------------
// GET /api/settings
// -----------------------------
pub async fn get_settings(State(state): State<AppState>) -> Json<CalcSettings> {
    Json(preferences::calc_settings(state.store.as_ref()))
}

// -----------------------------
// PUT /api/settings
// Clears cached schedules and calendars, then reloads today
// -----------------------------
pub async fn put_settings(
    State(state): State<AppState>,
    Json(input): Json<CalcSettings>,
) -> Result<Json<CalcSettings>, AppError> {
    if !(0..=1).contains(&input.school) {
        return Err(AppError::BadRequest("school must be 0 or 1".to_string()));
    }
    if input.method < 0 {
        return Err(AppError::BadRequest("method must not be negative".to_string()));
    }

    preferences::save_calc_settings(state.store.as_ref(), &input)?;
    reload_after_change(&state).await;
    Ok(Json(input))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageBody {
    pub language: Language,
}

pub async fn get_language(State(state): State<AppState>) -> Json<LanguageBody> {
    Json(LanguageBody {
        language: preferences::language(state.store.as_ref()),
    })
}

pub async fn put_language(
    State(state): State<AppState>,
    Json(input): Json<LanguageBody>,
) -> Result<Json<LanguageBody>, AppError> {
    preferences::save_language(state.store.as_ref(), input.language)?;
    Ok(Json(input))
}

#[derive(Debug, Serialize)]
pub struct StringsResponse {
    pub language: Language,
    pub strings: BTreeMap<MessageId, &'static str>,
}

// -----------------------------
// GET /api/strings
// UI strings for the saved language
// -----------------------------
pub async fn get_strings(State(state): State<AppState>) -> Json<StringsResponse> {
    let language = preferences::language(state.store.as_ref());
    Json(StringsResponse {
        language,
        strings: i18n::all_texts(language),
    })
}

// -----------------------------
// GET /api/notifications
// -----------------------------
pub async fn get_notifications(State(state): State<AppState>) -> Json<NotificationSettings> {
    Json(settings::load(state.store.as_ref()))
}

// -----------------------------
// PUT /api/notifications
// Rejects the whole update (nothing saved) when any sub-window
// falls outside its prayer window or has start after end.
// -----------------------------
pub async fn put_notifications(
    State(state): State<AppState>,
    Json(candidate): Json<NotificationSettings>,
) -> Result<Json<NotificationSettings>, AppError> {
    let day = loader::current_day(&state).await?;
    let (cleaned, invalid) = settings::validate(&candidate, &day.schedule);
    if !invalid.is_empty() {
        let lang = preferences::language(state.store.as_ref());
        return Err(AppError::Validation {
            message: i18n::text(lang, MessageId::NotificationError).to_string(),
            invalid,
        });
    }

    settings::save(state.store.as_ref(), &cleaned)?;
    state.scheduler.settings_changed(cleaned.clone()).await;
    Ok(Json(cleaned))
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub visible: bool,
    pub prayer: Option<Prayer>,
    pub label: Option<&'static str>,
    pub message: Option<String>,
    pub until: Option<NaiveDateTime>,
    pub countdown: Option<String>,
    pub dismissed_for: Option<Prayer>,
    pub scheduler: SchedulerState,
    pub schedule_date: Option<NaiveDate>,
    pub wakeups: u64,
}

// -----------------------------
// GET /api/notifications/alert
// What the scheduler currently shows, polled by the front-end
// -----------------------------
pub async fn get_alert(State(state): State<AppState>) -> Json<AlertResponse> {
    let snapshot = state.scheduler.snapshot();
    let lang = preferences::language(state.store.as_ref());
    let now = state.clock.now();

    let alert = snapshot.alert;
    Json(AlertResponse {
        visible: alert.is_some(),
        prayer: alert.map(|a| a.prayer),
        label: alert.map(|a| i18n::prayer_name(lang, a.prayer)),
        message: alert.map(|a| {
            format!(
                "{} {}",
                i18n::text(lang, MessageId::TimeForPrayer),
                i18n::prayer_name(lang, a.prayer)
            )
        }),
        until: alert.map(|a| a.until),
        countdown: alert.map(|a| format_alert_countdown(a.until - now)),
        dismissed_for: snapshot.dismissed_for,
        scheduler: snapshot.state,
        schedule_date: snapshot.schedule_date,
        wakeups: snapshot.fires,
    })
}

// -----------------------------
// POST /api/notifications/dismiss
// Hides the alert until the next prayer window begins
// -----------------------------
pub async fn dismiss_alert(State(state): State<AppState>) -> impl IntoResponse {
    state.scheduler.dismiss().await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveTime;

    use super::*;
    use crate::loader::tests::{test_state, TIMINGS};
    use crate::settings::SubWindow;

    fn hm(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    async fn loaded_state(server: &mut mockito::ServerGuard, now: &str) -> AppState {
        let _mock = server
            .mock("GET", "/v1/timingsByCity")
            .match_query(mockito::Matcher::Any)
            .with_body(TIMINGS)
            .create_async()
            .await;
        let state = test_state(&server.url(), now);
        loader::load_today(&state).await.unwrap();
        state
    }

    #[tokio::test]
    async fn blank_location_is_rejected_with_message() {
        let server = mockito::Server::new_async().await;
        let state = test_state(&server.url(), "10:00");

        let input = LocationInput {
            city: "  ".into(),
            country: "Bangladesh".into(),
        };
        let err = put_location(State(state.clone()), Json(input)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("city and country")));
        assert_eq!(preferences::saved_location(state.store.as_ref()), None);
    }

    #[tokio::test]
    async fn invalid_notification_window_is_not_saved() {
        let mut server = mockito::Server::new_async().await;
        let state = loaded_state(&mut server, "10:00").await;

        let mut candidate = NotificationSettings::default();
        candidate.prayers.insert(Prayer::Dhuhr, SubWindow::new(hm("12:30"), hm("13:00")));
        // Asr window opens at 15:45
        candidate.prayers.insert(Prayer::Asr, SubWindow::new(hm("15:00"), hm("16:00")));

        let err = put_notifications(State(state.clone()), Json(candidate))
            .await
            .unwrap_err();
        match err {
            AppError::Validation { invalid, .. } => assert_eq!(invalid, vec![Prayer::Asr]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(settings::load(state.store.as_ref()), NotificationSettings::default());
    }

    #[tokio::test]
    async fn valid_notification_window_shows_alert() {
        let mut server = mockito::Server::new_async().await;
        let state = loaded_state(&mut server, "12:40").await;

        let mut candidate = NotificationSettings::default();
        candidate.prayers.insert(Prayer::Dhuhr, SubWindow::new(hm("12:30"), hm("13:00")));
        let Json(saved) = put_notifications(State(state.clone()), Json(candidate.clone()))
            .await
            .unwrap();
        assert_eq!(saved, candidate);
        assert_eq!(settings::load(state.store.as_ref()), candidate);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let Json(alert) = get_alert(State(state.clone())).await;
        assert!(alert.visible);
        assert_eq!(alert.prayer, Some(Prayer::Dhuhr));
        assert_eq!(alert.countdown.as_deref(), Some("20:00"));
        assert_eq!(alert.schedule_date, NaiveDate::from_ymd_opt(2026, 3, 10));

        let resp = dismiss_alert(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let Json(alert) = get_alert(State(state)).await;
        assert!(!alert.visible);
        assert_eq!(alert.dismissed_for, Some(Prayer::Dhuhr));
    }

    #[tokio::test]
    async fn language_round_trips() {
        let server = mockito::Server::new_async().await;
        let state = test_state(&server.url(), "10:00");

        let Json(saved) =
            put_language(State(state.clone()), Json(LanguageBody { language: Language::Bn }))
                .await
                .unwrap();
        assert_eq!(saved.language, Language::Bn);
        let Json(body) = get_language(State(state)).await;
        assert_eq!(body.language, Language::Bn);
    }

    #[tokio::test]
    async fn partial_prayer_map_is_saved_in_full() {
        let mut server = mockito::Server::new_async().await;
        let state = loaded_state(&mut server, "10:00").await;

        let candidate = NotificationSettings {
            enabled: true,
            prayers: [(Prayer::Asr, SubWindow::new(hm("15:50"), hm("16:00")))]
                .into_iter()
                .collect(),
        };
        let Json(saved) = put_notifications(State(state.clone()), Json(candidate))
            .await
            .unwrap();

        assert_eq!(saved.prayers.len(), Prayer::ALL.len());
        assert_eq!(saved.sub_window(Prayer::Fajr), SubWindow::default());
        assert_eq!(saved.sub_window(Prayer::Asr), SubWindow::new(hm("15:50"), hm("16:00")));
        let Json(read_back) = get_notifications(State(state)).await;
        assert_eq!(read_back, saved);
    }

    #[tokio::test]
    async fn strings_follow_saved_language() {
        let server = mockito::Server::new_async().await;
        let state = test_state(&server.url(), "10:00");
        preferences::save_language(state.store.as_ref(), Language::Bn).unwrap();

        let Json(resp) = get_strings(State(state)).await;
        assert_eq!(resp.language, Language::Bn);
        assert_eq!(resp.strings.len(), MessageId::ALL.len());
        assert_eq!(
            resp.strings[&MessageId::TimeForPrayer],
            i18n::text(Language::Bn, MessageId::TimeForPrayer)
        );
    }
}
