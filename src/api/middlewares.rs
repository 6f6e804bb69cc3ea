//! Middleware module.
//!
//! Provides webhook authentication.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::error::AppError;

/// Header Telegram echoes the `secret_token` of `setWebhook` in.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Webhook authentication middleware.
///
/// Rejects requests whose `X-Telegram-Bot-Api-Secret-Token` header does not
/// match the secret registered with `setWebhook`.
///
/// # Error Responses
///
/// - 401 Unauthorized: When the header is missing or wrong
pub async fn webhook_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_secret(&request) else {
        return Err(AppError::Unauthorized("No secret token provided".to_string()));
    };

    if !secrets_match(token, &state.webhook_secret) {
        tracing::warn!("Webhook request with wrong secret token");
        return Err(AppError::Unauthorized("Invalid secret token".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_secret(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(SECRET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Compares without short-circuiting on the first differing byte.
fn secrets_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ extract_secret 함수 테스트 ============

    #[test]
    fn test_extract_secret_from_header() {
        let request = Request::builder()
            .uri("/webhook")
            .header("X-Telegram-Bot-Api-Secret-Token", "s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_secret(&request), Some("s3cret"));
    }

    #[test]
    fn test_extract_secret_missing() {
        let request = Request::builder().uri("/webhook").body(Body::empty()).unwrap();
        assert!(extract_secret(&request).is_none());
    }

    #[test]
    fn test_extract_secret_ignores_authorization() {
        let request = Request::builder()
            .uri("/webhook")
            .header("Authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        assert!(extract_secret(&request).is_none());
    }

    // ============ secrets_match 함수 테스트 ============

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc_DEF-123", "abc_DEF-123"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
        assert!(!secrets_match("", "abc"));
    }

    #[test]
    fn test_secrets_match_is_case_sensitive() {
        assert!(!secrets_match("SECRET", "secret"));
    }
}
