//! API module.
//!
//! Contains HTTP handlers, routes, and middleware.

pub mod handlers;
pub mod middlewares;
pub mod routes;
pub mod state;

pub use handlers::{HealthResponse, ReadinessResponse};
pub use middlewares::SECRET_TOKEN_HEADER;
pub use routes::create_routes;
pub use state::AppState;
