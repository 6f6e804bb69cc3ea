//! Telegram Bot API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::telegram::types::{
    ApiResponse, ChatId, File, GetUpdatesRequest, Message, SendMessageRequest,
    SetWebhookRequest, Update, User,
};

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: [&str; 1] = ["message"];

/// Extra time granted on top of the long-poll timeout before the request is abandoned.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Operations the conversation logic needs from the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a plain text message.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> AppResult<()>;

    /// Downloads the file behind `file_id`.
    async fn fetch_file(&self, file_id: &str) -> AppResult<Vec<u8>>;
}

/// HTTP client for `https://api.telegram.org/bot<token>/<method>`.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    method_base: String,
    file_base: String,
    max_file_bytes: usize,
}

impl TelegramClient {
    /// Creates a client for the given API root and bot token.
    pub fn new(
        api_url: &str,
        token: &str,
        timeout: Duration,
        max_file_bytes: usize,
    ) -> AppResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(default_headers)
            .build()
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        let api_url = api_url.trim_end_matches('/');
        Ok(Self {
            http,
            method_base: format!("{api_url}/bot{token}"),
            file_base: format!("{api_url}/file/bot{token}"),
            max_file_bytes,
        })
    }

    /// Creates a client from the application configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(
            &config.telegram_api_url,
            &config.telegram_bot_token,
            Duration::from_secs(config.http_timeout_secs),
            config.max_image_bytes,
        )
    }

    /// Calls a Bot API method and unwraps the `{ ok, result }` envelope.
    ///
    /// Request URLs embed the bot token, so transport errors are stripped of
    /// their URL before they reach logs.
    async fn call<P, T>(&self, method: &str, params: &P, timeout: Option<Duration>) -> AppResult<T>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{method}", self.method_base))
            .json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        into_result(method, body)
    }

    /// `getMe`: identity of the bot, doubles as a connectivity check.
    pub async fn get_me(&self) -> AppResult<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// `getUpdates` long poll starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> AppResult<Vec<Update>> {
        let params = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        let timeout = Duration::from_secs(timeout_secs) + LONG_POLL_GRACE;
        self.call("getUpdates", &params, Some(timeout)).await
    }

    /// `sendMessage` with plain text.
    pub async fn send_text(&self, chat_id: ChatId, text: &str) -> AppResult<Message> {
        self.call("sendMessage", &SendMessageRequest { chat_id, text }, None)
            .await
    }

    /// `getFile`: resolves a file id to a downloadable path.
    pub async fn get_file(&self, file_id: &str) -> AppResult<File> {
        self.call("getFile", &serde_json::json!({ "file_id": file_id }), None)
            .await
    }

    /// Downloads a file previously resolved with `get_file`.
    pub async fn download_file(&self, file_path: &str) -> AppResult<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/{file_path}", self.file_base))
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        if !response.status().is_success() {
            return Err(AppError::Telegram(format!(
                "file download failed with status {}",
                response.status().as_u16()
            )));
        }

        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        self.check_size(bytes.len() as u64)?;

        Ok(bytes.to_vec())
    }

    /// `setWebhook` with a secret token echoed back in every request.
    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> AppResult<bool> {
        let params = SetWebhookRequest {
            url,
            secret_token,
            allowed_updates: ALLOWED_UPDATES.to_vec(),
            drop_pending_updates: false,
        };
        self.call("setWebhook", &params, None).await
    }

    /// `deleteWebhook`, required before `getUpdates` can be used.
    pub async fn delete_webhook(&self) -> AppResult<bool> {
        self.call(
            "deleteWebhook",
            &serde_json::json!({ "drop_pending_updates": false }),
            None,
        )
        .await
    }

    fn check_size(&self, len: u64) -> AppResult<()> {
        if len > self.max_file_bytes as u64 {
            return Err(AppError::BadRequest(format!(
                "file is {len} bytes, limit is {}",
                self.max_file_bytes
            )));
        }
        Ok(())
    }
}

/// Unwraps an API envelope into the method result.
fn into_result<T>(method: &str, body: ApiResponse<T>) -> AppResult<T> {
    if !body.ok {
        let description = body
            .description
            .unwrap_or_else(|| "no description".to_string());
        let code = body.error_code.unwrap_or_default();
        if let Some(retry_after) = body.parameters.and_then(|p| p.retry_after) {
            return Err(AppError::RateLimited {
                method: method.to_string(),
                retry_after,
            });
        }
        return Err(AppError::Telegram(format!("{method}: [{code}] {description}")));
    }

    body.result
        .ok_or_else(|| AppError::Telegram(format!("{method}: response without result")))
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        self.send_text(chat_id, text).await.map(|_| ())
    }

    async fn fetch_file(&self, file_id: &str) -> AppResult<Vec<u8>> {
        let file = self.get_file(file_id).await?;

        if let Some(size) = file.file_size {
            self.check_size(size)?;
        }

        let path = file
            .file_path
            .ok_or_else(|| AppError::Telegram("getFile: file is not downloadable".to_string()))?;

        self.download_file(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TelegramClient {
        TelegramClient::new(
            "https://api.telegram.org/",
            "123:abc",
            Duration::from_secs(5),
            1024,
        )
        .unwrap()
    }

    #[test]
    fn test_client_builds_urls() {
        let client = client();
        assert_eq!(client.method_base, "https://api.telegram.org/bot123:abc");
        assert_eq!(client.file_base, "https://api.telegram.org/file/bot123:abc");
    }

    #[test]
    fn test_check_size() {
        let client = client();
        assert!(client.check_size(1024).is_ok());
        assert!(matches!(client.check_size(1025), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_into_result_ok() {
        let body: ApiResponse<bool> = serde_json::from_str(r#"{"ok": true, "result": true}"#).unwrap();
        assert!(into_result("setWebhook", body).unwrap());
    }

    #[test]
    fn test_into_result_error_carries_description() {
        let body: ApiResponse<bool> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .unwrap();
        let err = into_result("getMe", body).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("getMe"));
        assert!(msg.contains("401"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn test_into_result_flood_control_is_rate_limited() {
        let body: ApiResponse<bool> = serde_json::from_str(
            r#"{"ok": false, "error_code": 429, "description": "Too Many Requests: retry after 5", "parameters": {"retry_after": 5}}"#,
        )
        .unwrap();
        let err = into_result("sendMessage", body).unwrap_err();
        assert!(matches!(
            err,
            AppError::RateLimited { ref method, retry_after: 5 } if method == "sendMessage"
        ));
    }

    #[test]
    fn test_into_result_missing_result() {
        let body: ApiResponse<bool> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(matches!(
            into_result("getMe", body),
            Err(AppError::Telegram(_))
        ));
    }

    #[test]
    fn test_get_updates_request_serialize() {
        let params = GetUpdatesRequest {
            offset: 5,
            timeout: 20,
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["offset"], 5);
        assert_eq!(json["allowed_updates"][0], "message");
    }
}
