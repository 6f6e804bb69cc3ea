//! Telegram Bot API module.

pub mod client;
pub mod polling;
pub mod types;

pub use client::{ChatApi, TelegramClient};
pub use polling::{run_polling, PollingOptions};
pub use types::{ChatId, Message, MessageContent, Update, User};
