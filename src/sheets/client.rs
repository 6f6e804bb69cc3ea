//! Google Sheets v4 values client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::sheets::auth::GoogleAuth;
use crate::sheets::row::InventoryRow;
use crate::sheets::RowSink;

pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Appends rows to one range of one spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: GoogleAuth,
    append_url: String,
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        auth: GoogleAuth,
        api_url: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Self {
        let append_url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}:append",
            api_url.trim_end_matches('/')
        );
        Self {
            http,
            auth,
            append_url,
        }
    }

    /// Builds the client from `SPREADSHEET_ID`, `SERVICE_ACCOUNT_JSON` and
    /// `SHEET_RANGE`.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        if !config.sheets_configured() {
            return Err(AppError::Config(
                "SPREADSHEET_ID and SERVICE_ACCOUNT_JSON must both be set".to_string(),
            ));
        }

        let auth = GoogleAuth::from_service_account_json(&config.service_account_json)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self::new(
            http,
            auth,
            SHEETS_API_URL,
            &config.spreadsheet_id,
            &config.sheet_range,
        ))
    }

    pub fn service_account(&self) -> &str {
        self.auth.client_email()
    }

    /// `values.append` of a single row, stored as typed.
    pub async fn append_row(&self, row: &InventoryRow) -> AppResult<()> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(&self.append_url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": [row.values()] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Sheets(format!(
                "append returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RowSink for SheetsClient {
    async fn append(&self, row: &InventoryRow) -> AppResult<()> {
        self.append_row(row).await
    }
}
