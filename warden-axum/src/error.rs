use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use warden::WardenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Account temporarily suspended")]
    Suspended {
        until: Option<DateTime<Utc>>,
        reason: Option<String>,
    },

    #[error("Too many requests")]
    RateLimited { resets_at: Option<DateTime<Utc>> },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<WardenError> for ApiError {
    fn from(err: WardenError) -> Self {
        match err {
            WardenError::ValidationError(msg) => ApiError::BadRequest(msg),
            // Fail closed: a check that could not be evaluated is an internal
            // error, never an allow.
            WardenError::StorageError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<warden_core::Error> for ApiError {
    fn from(err: warden_core::Error) -> Self {
        match err {
            warden_core::Error::Validation(e) => ApiError::BadRequest(e.to_string()),
            warden_core::Error::Storage(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

fn retry_after(lifts_at: Option<DateTime<Utc>>) -> Option<i64> {
    lifts_at.map(|at| (at - Utc::now()).num_seconds().max(0))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Suspended { until, reason } => {
                let body = Json(json!({
                    "error": "Account temporarily suspended. Please try again later.",
                    "reason": reason,
                    "suspension_end": until,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Some(seconds) = retry_after(until)
                    && let Ok(value) = seconds.to_string().parse()
                {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            ApiError::RateLimited { resets_at } => {
                let body = Json(json!({
                    "error": "Too many requests. Please try again later.",
                    "reset_time": resets_at,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Some(seconds) = retry_after(resets_at)
                    && let Ok(value) = seconds.to_string().parse()
                {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            ApiError::InvalidCredentials => {
                let body = Json(json!({
                    "error": "Invalid credentials",
                    "code": StatusCode::UNAUTHORIZED.as_u16(),
                }));
                (StatusCode::UNAUTHORIZED, body).into_response()
            }
            ApiError::BadRequest(ref msg) => {
                let body = Json(json!({
                    "error": msg,
                    "code": StatusCode::BAD_REQUEST.as_u16(),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotFound => {
                let body = Json(json!({
                    "error": "Not found",
                    "code": StatusCode::NOT_FOUND.as_u16(),
                }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::InternalError(ref msg) => {
                tracing::error!(error = %msg, "internal error handling request");
                // The detail stays in the log; the client gets a generic body.
                let body = Json(json!({
                    "error": "Internal server error",
                    "code": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
