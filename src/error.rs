//! 중앙화된 에러 처리 모듈.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type.
///
/// All errors in the application should be converted to this type
/// for consistent error handling and reporting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad request error (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized error (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Not found error (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram Bot API answered with `ok: false`
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Telegram flood control (429); retry no sooner than `retry_after` seconds
    #[error("Telegram rate limit on {method}, retry after {retry_after}s")]
    RateLimited { method: String, retry_after: u64 },

    /// Image could not be decoded or processed
    #[error("Image error: {0}")]
    Image(String),

    /// OCR engine failure
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Google Sheets API failure
    #[error("Sheets error: {0}")]
    Sheets(String),

    /// Service account authentication failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error (Telegram, Google)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// I/O error (subprocesses, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) | Self::Config(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Self::Telegram(msg) | Self::Sheets(msg) | Self::Auth(msg) => {
                tracing::warn!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            Self::Image(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Ocr(msg) => {
                tracing::error!("OCR error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OCR engine error".to_string(),
                )
            }
            Self::RateLimited { .. } => {
                tracing::warn!("Upstream error: {self}");
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            Self::Json(e) => {
                tracing::error!("JSON error: {e:?}");
                (StatusCode::BAD_REQUEST, format!("JSON error: {e}"))
            }
            Self::HttpClient(e) => {
                tracing::warn!("HTTP client error: {e:?}");
                (StatusCode::BAD_GATEWAY, "External service error".to_string())
            }
            Self::Io(e) => {
                tracing::error!("I/O error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "I/O error occurred".to_string(),
                )
            }
        };

        // Report error to Sentry for server errors
        if status.is_server_error() {
            sentry::capture_error(&self);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl AppError {
    /// Server-mandated wait before the failed call may be retried.
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;
