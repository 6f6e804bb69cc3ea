//! Per-chat update queues.
//!
//! Updates of one chat are handled strictly in arrival order by a dedicated
//! worker task; different chats progress concurrently. Workers exit after a
//! period of inactivity and are recreated on the next update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::bot::Bot;
use crate::telegram::{ChatId, Update};

/// Pending updates per chat before `dispatch` starts waiting.
const CHAT_QUEUE_CAPACITY: usize = 64;

/// How long a chat worker lingers without updates.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Routes updates to chat workers.
#[derive(Clone)]
pub struct Dispatcher {
    bot: Arc<Bot>,
    workers: Arc<Mutex<HashMap<ChatId, mpsc::Sender<Update>>>>,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self::with_idle_timeout(bot, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(bot: Arc<Bot>, idle_timeout: Duration) -> Self {
        Self {
            bot,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub const fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// Queues an update. Updates without a chat are handled inline.
    pub async fn dispatch(&self, update: Update) {
        let Some(chat_id) = update.message.as_ref().map(|m| m.chat.id) else {
            self.bot.handle_update(update).await;
            return;
        };

        let mut update = update;
        // A worker that timed out closes its queue; retry once with a fresh one.
        for _ in 0..2 {
            let sender = self.sender_for(chat_id);
            match sender.send(update).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    self.forget(chat_id, &sender);
                    update = returned;
                }
            }
        }

        tracing::warn!(chat_id, "Chat worker unavailable, handling update inline");
        self.bot.handle_update(update).await;
    }

    /// Number of live chat workers.
    pub fn active_chats(&self) -> usize {
        self.lock_workers().len()
    }

    fn sender_for(&self, chat_id: ChatId) -> mpsc::Sender<Update> {
        let mut workers = self.lock_workers();
        if let Some(sender) = workers.get(&chat_id).filter(|s| !s.is_closed()) {
            return sender.clone();
        }

        let (tx, rx) = mpsc::channel(CHAT_QUEUE_CAPACITY);
        workers.insert(chat_id, tx.clone());
        tokio::spawn(run_chat_worker(
            chat_id,
            Arc::clone(&self.bot),
            rx,
            self.idle_timeout,
            Arc::clone(&self.workers),
        ));
        tracing::debug!(chat_id, "Chat worker started");

        tx
    }

    fn forget(&self, chat_id: ChatId, sender: &mpsc::Sender<Update>) {
        let mut workers = self.lock_workers();
        if workers.get(&chat_id).is_some_and(|s| s.same_channel(sender)) {
            workers.remove(&chat_id);
        }
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, HashMap<ChatId, mpsc::Sender<Update>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_chat_worker(
    chat_id: ChatId,
    bot: Arc<Bot>,
    mut rx: mpsc::Receiver<Update>,
    idle_timeout: Duration,
    workers: Arc<Mutex<HashMap<ChatId, mpsc::Sender<Update>>>>,
) {
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(update)) => bot.handle_update(update).await,
            Ok(None) => break,
            Err(_elapsed) => {
                // Refuse new sends, then finish whatever already made it in.
                rx.close();
                while let Some(update) = rx.recv().await {
                    bot.handle_update(update).await;
                }
                break;
            }
        }
    }

    let mut workers = workers.lock().unwrap_or_else(PoisonError::into_inner);
    if workers.get(&chat_id).is_some_and(mpsc::Sender::is_closed) {
        workers.remove(&chat_id);
    }
    tracing::debug!(chat_id, "Chat worker stopped");
}
