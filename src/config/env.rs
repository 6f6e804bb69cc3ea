//! Environment variable configuration module.
//!
//! Provides environment variable loading and the global `APP_CONFIG` instance.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use once_cell::sync::Lazy;

use crate::error::{AppError, AppResult};
use crate::utils::{gen_rand_str, is_valid_secret_token};

static INIT: Once = Once::new();

/// Length of the generated webhook secret when none is configured.
const WEBHOOK_SECRET_LEN: usize = 32;

/// Initializes the environment by loading the .env file.
/// This is called automatically when `get_env` is first used.
fn init_env() {
    INIT.call_once(|| {
        if let Err(e) = dotenvy::dotenv() {
            tracing::warn!("Warning: .env file not found or error loading: {}", e);
        }
    });
}

/// Retrieves an environment variable by key.
///
/// If the variable is not set, returns the provided default value.
/// If no default is provided and the variable is not set, returns an empty string.
pub fn get_env(key: &str, default: Option<&str>) -> String {
    init_env();
    env::var(key).unwrap_or_else(|_| default.unwrap_or("").to_string())
}

/// Retrieves an environment variable as a parsed type.
pub fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    init_env();
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// How the bot receives updates from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    /// The bot long-polls `getUpdates` itself.
    Polling,
    /// Telegram pushes updates to `POST /webhook`.
    Webhook,
}

impl FromStr for BotMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" | "script" => Ok(Self::Polling),
            "webhook" | "server" => Ok(Self::Webhook),
            other => Err(AppError::Config(format!("Unknown BOT_MODE '{other}'"))),
        }
    }
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => f.write_str("polling"),
            Self::Webhook => f.write_str("webhook"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    // Telegram settings
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub bot_mode: String,
    pub webhook_public_url: String,
    pub webhook_secret: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,

    // Google Sheets settings
    pub spreadsheet_id: String,
    pub service_account_json: String,
    pub sheet_range: String,

    // OCR settings
    pub tesseract_cmd: String,
    pub ocr_lang: String,
    pub ocr_timeout_secs: u64,
    pub ocr_code_pattern: String,
    pub max_image_bytes: usize,

    // Server settings
    pub server_port: String,
    pub worker_threads: usize,
    pub http_timeout_secs: u64,

    // Environment
    pub is_production: bool,

    // Sentry settings
    pub sentry_dsn: String,
    pub sentry_traces_sample_rate: f32,

    // Rate limiting
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
}

impl AppConfig {
    /// Creates a new `AppConfig` from environment variables.
    pub fn from_env() -> Self {
        let rust_env = get_env("RUST_ENV", Some("development"));
        let is_production = rust_env == "production" || rust_env == "prod";

        let webhook_secret = match get_env("WEBHOOK_SECRET", None) {
            secret if secret.is_empty() => gen_rand_str(WEBHOOK_SECRET_LEN),
            secret => secret,
        };

        Self {
            telegram_bot_token: get_env("TELEGRAM_BOT_TOKEN", None),
            telegram_api_url: get_env("TELEGRAM_API_URL", Some("https://api.telegram.org")),
            bot_mode: get_env("BOT_MODE", Some("polling")),
            webhook_public_url: get_env("WEBHOOK_PUBLIC_URL", None),
            webhook_secret,
            poll_interval_secs: get_env_parsed("POLL_INTERVAL_SECS", 1),
            poll_timeout_secs: get_env_parsed("POLL_TIMEOUT_SECS", 20),

            spreadsheet_id: get_env("SPREADSHEET_ID", None),
            service_account_json: get_env("SERVICE_ACCOUNT_JSON", None),
            sheet_range: get_env("SHEET_RANGE", Some("A1")),

            tesseract_cmd: get_env("TESSERACT_CMD", Some("tesseract")),
            ocr_lang: get_env("OCR_LANG", Some("eng")),
            ocr_timeout_secs: get_env_parsed("OCR_TIMEOUT_SECS", 30),
            ocr_code_pattern: get_env("OCR_CODE_PATTERN", Some(r"AZT\d+")),
            max_image_bytes: get_env_parsed("MAX_IMAGE_BYTES", 20 * 1024 * 1024),

            server_port: get_env("SERVER_PORT", Some("5000")),
            worker_threads: get_env_parsed("WORKER_THREADS", 0),
            http_timeout_secs: get_env_parsed("HTTP_TIMEOUT_SECS", 30),

            is_production,

            sentry_dsn: get_env("SENTRY_DSN", None),
            sentry_traces_sample_rate: get_env_parsed("SENTRY_TRACES_SAMPLE_RATE", 0.1),

            rate_limit_per_second: get_env_parsed("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: get_env_parsed("RATE_LIMIT_BURST_SIZE", 50),
        }
    }

    /// Checks settings the bot cannot start without.
    pub fn validate(&self) -> AppResult<()> {
        if self.telegram_bot_token.is_empty() || !self.telegram_bot_token.contains(':') {
            return Err(AppError::Config(
                "Invalid Telegram bot token. Make sure TELEGRAM_BOT_TOKEN is set.".to_string(),
            ));
        }

        if self.mode()? == BotMode::Webhook && self.webhook_public_url.is_empty() {
            return Err(AppError::Config(
                "WEBHOOK_PUBLIC_URL is required when BOT_MODE=webhook".to_string(),
            ));
        }

        if !is_valid_secret_token(&self.webhook_secret) {
            return Err(AppError::Config(
                "WEBHOOK_SECRET may only contain A-Z, a-z, 0-9, _ and -".to_string(),
            ));
        }

        regex::Regex::new(&self.ocr_code_pattern)
            .map_err(|e| AppError::Config(format!("Invalid OCR_CODE_PATTERN: {e}")))?;

        self.port()?;

        Ok(())
    }

    /// Parsed `SERVER_PORT`.
    pub fn port(&self) -> AppResult<u16> {
        self.server_port.trim().parse().map_err(|_| {
            AppError::Config(format!(
                "SERVER_PORT must be a port number, got {:?}",
                self.server_port
            ))
        })
    }

    /// Parsed update delivery mode.
    pub fn mode(&self) -> AppResult<BotMode> {
        self.bot_mode.parse()
    }

    /// Whether both spreadsheet id and credentials are present.
    pub fn sheets_configured(&self) -> bool {
        !self.spreadsheet_id.is_empty() && !self.service_account_json.is_empty()
    }
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("bot_mode", &self.bot_mode)
            .field("webhook_public_url", &self.webhook_public_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_range", &self.sheet_range)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("ocr_lang", &self.ocr_lang)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("ocr_code_pattern", &self.ocr_code_pattern)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("server_port", &self.server_port)
            .field("worker_threads", &self.worker_threads)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("is_production", &self.is_production)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .field("rate_limit_per_second", &self.rate_limit_per_second)
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .finish_non_exhaustive()
    }
}

/// Global application configuration instance.
pub static APP_CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
