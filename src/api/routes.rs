//! 라우트 설정 모듈.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::handlers::{health_handler, readiness_handler, webhook_handler};
use crate::api::middlewares::webhook_auth;
use crate::api::state::AppState;

/// Creates and configures all application routes.
///
/// # Routes
///
/// ## Health Check Routes
/// - `GET /health` - Liveness check
/// - `GET /ready` - Readiness check
///
/// ## Telegram
/// - `POST /webhook` - Update delivery (webhook mode only, requires the
///   secret token header)
pub fn create_routes(state: AppState, webhook_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(readiness_handler));

    if webhook_enabled {
        let webhook_routes = Router::new()
            .route("/webhook", post(webhook_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), webhook_auth));
        router = router.merge(webhook_routes);
    }

    router.with_state(state)
}
