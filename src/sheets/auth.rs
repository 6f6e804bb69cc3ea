//! Google service account authentication.
//!
//! Token signing, exchange and caching are handled by `gcp_auth`; this
//! wraps a provider with the scopes the Sheets client needs.

use std::fmt;
use std::sync::Arc;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Scopes needed to append rows to a spreadsheet.
pub const SHEETS_SCOPES: &[&str] = &[
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// The key file field logged at startup.
#[derive(Deserialize)]
struct KeyIdentity {
    client_email: String,
}

/// Hands out Sheets access tokens for one service account.
pub struct GoogleAuth {
    provider: Arc<dyn TokenProvider>,
    client_email: String,
}

impl GoogleAuth {
    pub fn new(provider: Arc<dyn TokenProvider>, client_email: impl Into<String>) -> Self {
        Self {
            provider,
            client_email: client_email.into(),
        }
    }

    /// Builds a provider from the contents of a service account key file.
    pub fn from_service_account_json(json: &str) -> AppResult<Self> {
        let identity: KeyIdentity = serde_json::from_str(json)
            .map_err(|e| AppError::Auth(format!("Invalid service account JSON: {e}")))?;
        let account = CustomServiceAccount::from_json(json)
            .map_err(|e| AppError::Auth(format!("Invalid service account key: {e}")))?;

        Ok(Self::new(Arc::new(account), identity.client_email))
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Returns a valid access token; `gcp_auth` caches it until expiry.
    pub async fn access_token(&self) -> AppResult<String> {
        let token = self
            .provider
            .token(SHEETS_SCOPES)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to get Google token: {e}")))?;

        Ok(token.as_str().to_string())
    }
}

impl fmt::Debug for GoogleAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAuth")
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}
