// Define data modules
mod models;   // Data structures (Prayer, Location, API payloads)
mod error;    // Error types and their HTTP mapping
mod config;   // Environment configuration and logging setup
mod clock;    // Wall-clock abstraction
mod store;    // Persistent key-value storage (store.json)
mod windows;  // Prayer windows derived from a day's start times
mod settings; // Notification sub-windows and their validation
mod trigger;  // Alert show/hide decisions
mod scheduler; // Self-rearming notification timer
mod preferences; // Location, calculation method, language
mod tracking; // Completion log and statistics
mod i18n;     // English / Bengali strings
mod display;  // Countdown, clock and Hijri formatting
mod api_client; // Remote timings / Quran / geocoding APIs
mod loader;   // Schedule loading, caching and rollover
mod state;    // Shared handler state
mod routes_prayer;   // HTTP handlers for today, calendar, verse
mod routes_settings; // HTTP handlers for preferences and notifications
mod routes_tracking; // HTTP handlers for the completion log

use std::{process::exit, sync::Arc};

// Import axum routing utilities and Router
use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use log::{error, info, warn};
use tower_http::services::ServeDir; // Used to serve static files (HTML/CSS/JS)

use api_client::PrayerApiClient;
use clock::{Clock, SystemClock};
use config::AppConfig;
use state::AppState;
use store::{JsonFileStore, KvStore};

fn api_router() -> Router<AppState> {
    Router::new()
        // prayer times
        .route("/today", get(routes_prayer::get_today))
        .route("/today/refresh", post(routes_prayer::refresh_today))
        .route("/calendar", get(routes_prayer::get_calendar))
        .route("/ayah", get(routes_prayer::get_ayah))
        // preferences
        .route(
            "/location",
            get(routes_settings::get_location).put(routes_settings::put_location),
        )
        .route("/location/detect", post(routes_settings::detect_location))
        .route(
            "/settings",
            get(routes_settings::get_settings).put(routes_settings::put_settings),
        )
        .route(
            "/language",
            get(routes_settings::get_language).put(routes_settings::put_language),
        )
        .route("/strings", get(routes_settings::get_strings))
        // notifications
        .route(
            "/notifications",
            get(routes_settings::get_notifications).put(routes_settings::put_notifications),
        )
        .route("/notifications/alert", get(routes_settings::get_alert))
        .route("/notifications/dismiss", post(routes_settings::dismiss_alert))
        // completion log
        .route("/log/:prayer/toggle", post(routes_tracking::toggle_prayer))
        .route("/log/today", get(routes_tracking::get_today_log))
        .route(
            "/stats",
            get(routes_tracking::get_stats).delete(routes_tracking::reset_stats),
        )
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            exit(1)
        }
    };
    if let Err(e) = config::init_logging(&config.log_config_path) {
        eprintln!("{e}");
        exit(1)
    }

    let store: Arc<dyn KvStore> = match JsonFileStore::open(&config.data_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("cannot open store at {}: {e}", config.data_path);
            exit(1)
        }
    };

    // No geolocation on the server side: remember the fallback until the
    // front-end detects or the user enters a location.
    if preferences::saved_location(store.as_ref()).is_none() {
        if let Err(e) = preferences::save_location(store.as_ref(), &models::Location::fallback()) {
            warn!("could not save default location: {e}");
        }
    }

    let client = match PrayerApiClient::new(
        &config.aladhan_base_url,
        &config.alquran_base_url,
        &config.geocode_base_url,
        config.http_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("cannot build http client: {e}");
            exit(1)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (scheduler, scheduler_handle) =
        scheduler::spawn(clock.clone(), settings::load(store.as_ref()));
    let state = AppState::new(store, client, clock, scheduler);

    if let Err(e) = loader::load_today(&state).await {
        warn!("initial schedule load failed, will retry on rollover or refresh: {e}");
    }
    let rollover_handle = tokio::spawn(loader::rollover_loop(state.clone()));

    let app = Router::new()
        .nest("/api", api_router())
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("bind {addr} failed: {e}");
            exit(1)
        }
    };

    // Print the link to the server
    info!("Server running at http://{addr}");
    info!("Static files: http://{addr}/ ({})", config.static_dir);
    info!("API base:     http://{addr}/api");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("server error: {e}");
            }
        }
        _ = scheduler_handle => error!("scheduler stopped"),
        _ = rollover_handle => error!("rollover loop stopped"),
    }
}
