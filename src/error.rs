use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::Prayer;

/// A daily schedule that cannot be turned into prayer windows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("missing prayer time for {0}")]
    MissingPrayerTime(Prayer),

    #[error("invalid time '{value}' for {prayer}")]
    InvalidTime { prayer: Prayer, value: String },

    #[error("{later} ({later_time}) does not come after {earlier}")]
    NotIncreasing {
        earlier: Prayer,
        later: Prayer,
        later_time: String,
    },
}

/// Any failure reaching a remote API. Callers treat every variant as "unavailable".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned code {0}")]
    Api(i64),

    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        invalid: Vec<Prayer>,
    },

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(e) => {
                log::error!("storage failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            AppError::Validation { message, invalid } => json!({
                "error": message,
                "invalid": invalid,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
