//! HTTP request handler module.

use axum::{extract::State, http::StatusCode, Json};

use crate::api::state::AppState;
use crate::telegram::Update;

/// Health check response.
#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness check handler.
///
/// Returns OK if the server is running.
///
/// # Route
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(serde::Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub telegram: &'static str,
    pub sheets: &'static str,
    pub active_chats: usize,
}

/// Readiness check handler.
///
/// Checks that the Telegram Bot API answers `getMe`. A missing Sheets
/// configuration is reported but does not fail the check.
///
/// # Route
///
/// `GET /ready`
pub async fn readiness_handler(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let telegram_ok = match state.telegram.get_me().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check: Telegram unreachable");
            false
        }
    };
    let sheets_ok = state.sheets_configured();

    let response = ReadinessResponse {
        status: match (telegram_ok, sheets_ok) {
            (true, true) => "ok",
            (true, false) => "degraded",
            (false, _) => "unavailable",
        },
        telegram: if telegram_ok { "connected" } else { "disconnected" },
        sheets: if sheets_ok {
            "configured"
        } else {
            "not_configured"
        },
        active_chats: state.dispatcher.active_chats(),
    };

    if telegram_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Webhook handler.
///
/// Queues the update and acknowledges at once so Telegram does not retry
/// while a photo is being scanned.
///
/// # Route
///
/// `POST /webhook`
pub async fn webhook_handler(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "Webhook update received");

    // Enqueue before answering so per-chat order follows request order.
    state.dispatcher.dispatch(update).await;

    StatusCode::OK
}
