//! Application state module.
//!
//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use crate::bot::Dispatcher;
use crate::telegram::TelegramClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Routes webhook updates to chat workers
    pub dispatcher: Dispatcher,
    /// Used by the readiness check
    pub telegram: TelegramClient,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` value
    pub webhook_secret: Arc<str>,
}

impl AppState {
    /// Creates a new `AppState` instance.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, telegram: TelegramClient, webhook_secret: &str) -> Self {
        Self {
            dispatcher,
            telegram,
            webhook_secret: Arc::from(webhook_secret),
        }
    }

    /// Whether saved items reach a spreadsheet.
    pub fn sheets_configured(&self) -> bool {
        self.dispatcher.bot().has_sink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
