//! Long-polling update loop.

use std::time::Duration;

use tokio::sync::watch;

use crate::bot::Dispatcher;
use crate::error::AppError;
use crate::telegram::TelegramClient;

/// Upper bound for the retry delay after failed polls.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Polling settings.
#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    /// Pause between successful polls.
    pub interval: Duration,
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub timeout_secs: u64,
}

/// Next delay after `failures` consecutive failed polls.
pub fn backoff_delay(failures: u32) -> Duration {
    let secs = 1u64.checked_shl(failures.min(6)).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Delay before retrying a failed poll. A flood-control `retry_after`
/// from Telegram takes precedence over the exponential backoff.
pub fn retry_delay(error: &AppError, failures: u32) -> Duration {
    error
        .retry_after()
        .map_or_else(|| backoff_delay(failures), Duration::from_secs)
}

/// Polls `getUpdates` until `shutdown` flips to `true`.
///
/// Errors never stop the loop; they are logged and retried with backoff.
pub async fn run_polling(
    client: TelegramClient,
    dispatcher: Dispatcher,
    options: PollingOptions,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = client.delete_webhook().await {
        tracing::warn!(error = %e, "Failed to delete webhook before polling");
    }

    tracing::info!(
        interval_secs = options.interval.as_secs(),
        timeout_secs = options.timeout_secs,
        "Bot is polling for updates"
    );

    let mut offset: i64 = 0;
    let mut failures: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = client.get_updates(offset, options.timeout_secs) => result,
        };

        let delay = match result {
            Ok(updates) => {
                failures = 0;
                if !updates.is_empty() {
                    tracing::debug!(count = updates.len(), offset, "Received updates");
                }
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatcher.dispatch(update).await;
                }
                options.interval
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = retry_delay(&e, failures);
                tracing::error!(
                    error = %e,
                    failures,
                    retry_in_secs = delay.as_secs(),
                    "Polling failed"
                );
                delay
            }
        };

        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!("Polling stopped");
}
