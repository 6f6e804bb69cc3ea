//! Per-chat conversation state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::telegram::ChatId;

/// Where a chat is in the scanning flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatState {
    /// No session; only `/start` does anything useful.
    #[default]
    Idle,
    /// Waiting for a barcode photo (or `/manual`).
    WaitingPhoto,
    /// Waiting for a typed barcode.
    ManualBarcode,
    /// Waiting for the asset name.
    WaitingDescription,
    /// Waiting for the quantity.
    WaitingQuantity,
}

/// Item being assembled across messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
}

/// State plus draft of one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: ChatState,
    pub draft: ItemDraft,
}

impl Session {
    /// Fresh session waiting for the first photo.
    pub fn started() -> Self {
        Self {
            state: ChatState::WaitingPhoto,
            draft: ItemDraft::default(),
        }
    }

    /// Clears the draft and waits for the next item.
    pub fn next_item(&mut self) {
        self.state = ChatState::WaitingPhoto;
        self.draft = ItemDraft::default();
    }
}

/// In-memory session table shared by all chat workers.
///
/// Each chat is driven by a single worker, so a load/modify/store cycle
/// never races with another update of the same chat.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, `Idle` with an empty draft when none exists.
    pub fn get(&self, chat_id: ChatId) -> Session {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn put(&self, chat_id: ChatId, session: Session) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat_id, session);
    }

    /// Number of chats with a stored session.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
