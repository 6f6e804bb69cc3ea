//! Conversation handler.
//!
//! Turns incoming messages into replies and session transitions.

use std::sync::Arc;

use crate::bot::messages;
use crate::bot::state::{ChatState, ItemDraft, Session, SessionStore};
use crate::bot::Command;
use crate::scanner::CodeScanner;
use crate::sheets::{InventoryRow, RowSink};
use crate::telegram::{ChatApi, ChatId, Message, MessageContent, Update};

/// The asset registration bot.
pub struct Bot {
    api: Arc<dyn ChatApi>,
    scanner: Arc<dyn CodeScanner>,
    sink: Option<Arc<dyn RowSink>>,
    sessions: SessionStore,
}

impl Bot {
    /// Creates a bot. Without a sink every save attempt fails and the user
    /// is told so.
    pub fn new(
        api: Arc<dyn ChatApi>,
        scanner: Arc<dyn CodeScanner>,
        sink: Option<Arc<dyn RowSink>>,
    ) -> Self {
        Self {
            api,
            scanner,
            sink,
            sessions: SessionStore::new(),
        }
    }

    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Whether rows can be persisted.
    pub const fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Entry point for both polling and webhook delivery.
    pub async fn handle_update(&self, update: Update) {
        match update.message {
            Some(message) => self.handle_message(&message).await,
            None => tracing::debug!(update_id = update.update_id, "Ignoring non-message update"),
        }
    }

    pub async fn handle_message(&self, message: &Message) {
        let chat_id = message.chat.id;

        match message.content() {
            MessageContent::Command(command) => self.on_command(chat_id, command).await,
            MessageContent::Image(file_id) => self.on_image(chat_id, file_id).await,
            MessageContent::Text(text) => self.on_text(chat_id, text.trim()).await,
            MessageContent::Other => {
                tracing::debug!(chat_id, message_id = message.message_id, "Ignoring message");
            }
        }
    }

    async fn on_command(&self, chat_id: ChatId, command: Command) {
        tracing::info!(chat_id, command = command.name(), "Command received");

        match command {
            Command::Start => {
                self.sessions.put(chat_id, Session::started());
                self.reply(chat_id, messages::WELCOME).await;
            }
            Command::Help => self.reply(chat_id, messages::HELP).await,
            Command::Cancel => {
                self.set_state(chat_id, ChatState::Idle);
                self.reply(chat_id, messages::CANCELLED).await;
            }
            Command::Done => {
                self.set_state(chat_id, ChatState::Idle);
                self.reply(chat_id, messages::FINISHED).await;
            }
            Command::Manual => {
                if self.sessions.get(chat_id).state == ChatState::WaitingPhoto {
                    self.set_state(chat_id, ChatState::ManualBarcode);
                    self.reply(chat_id, messages::MANUAL_PROMPT).await;
                } else {
                    self.reply(chat_id, messages::MANUAL_NOT_ALLOWED).await;
                }
            }
        }
    }

    async fn on_image(&self, chat_id: ChatId, file_id: &str) {
        match self.sessions.get(chat_id).state {
            ChatState::Idle => return self.reply(chat_id, messages::NEED_START).await,
            ChatState::WaitingPhoto => {}
            _ => return self.reply(chat_id, messages::PHOTO_NOT_EXPECTED).await,
        }

        match self.read_code(chat_id, file_id).await {
            Some(barcode) => {
                let mut session = self.sessions.get(chat_id);
                session.draft.barcode = Some(barcode.clone());
                session.state = ChatState::WaitingDescription;
                self.sessions.put(chat_id, session);
                self.reply(chat_id, &messages::barcode_detected(&barcode))
                    .await;
            }
            // Stay in WaitingPhoto: retake, /manual, /cancel or /done.
            None => self.reply(chat_id, messages::BARCODE_NOT_FOUND).await,
        }
    }

    /// Downloads and scans the image. Every failure reads as "nothing found".
    async fn read_code(&self, chat_id: ChatId, file_id: &str) -> Option<String> {
        let bytes = match self.api.fetch_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(chat_id, error = %e, "Failed to download photo");
                return None;
            }
        };

        match self.scanner.scan(bytes).await {
            Ok(Some(code)) => {
                tracing::info!(chat_id, code = %code, "Code recognized");
                Some(code)
            }
            Ok(None) => {
                tracing::info!(chat_id, "No code recognized in photo");
                None
            }
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Failed to scan photo");
                None
            }
        }
    }

    async fn on_text(&self, chat_id: ChatId, text: &str) {
        let mut session = self.sessions.get(chat_id);

        match session.state {
            ChatState::Idle => self.reply(chat_id, messages::NEED_START).await,
            ChatState::WaitingPhoto => self.reply(chat_id, messages::EXPECTING_PHOTO).await,
            ChatState::ManualBarcode => {
                session.draft.barcode = Some(text.to_string());
                session.state = ChatState::WaitingDescription;
                self.sessions.put(chat_id, session);
                self.reply(chat_id, &messages::manual_barcode_accepted(text))
                    .await;
            }
            ChatState::WaitingDescription => {
                session.draft.description = Some(text.to_string());
                session.state = ChatState::WaitingQuantity;
                self.sessions.put(chat_id, session);
                self.reply(chat_id, messages::ASK_QUANTITY).await;
            }
            ChatState::WaitingQuantity => {
                let Some(quantity) = parse_quantity(text) else {
                    return self.reply(chat_id, messages::INVALID_QUANTITY).await;
                };
                session.draft.quantity = Some(quantity);

                let reply = if self.save(chat_id, &session.draft).await {
                    messages::item_saved(
                        session.draft.barcode.as_deref().unwrap_or(messages::NO_BARCODE),
                        session
                            .draft
                            .description
                            .as_deref()
                            .unwrap_or(messages::NO_DESCRIPTION),
                        quantity,
                    )
                } else {
                    messages::SAVE_FAILED.to_string()
                };

                session.next_item();
                self.sessions.put(chat_id, session);
                self.reply(chat_id, &reply).await;
            }
        }
    }

    /// Appends the draft as a row; `false` when nothing was written.
    async fn save(&self, chat_id: ChatId, draft: &ItemDraft) -> bool {
        let Some(sink) = &self.sink else {
            tracing::error!(chat_id, "Sheets is not configured, item not saved");
            return false;
        };

        let row = InventoryRow::from_draft(draft, chrono::Local::now());
        match sink.append(&row).await {
            Ok(()) => {
                tracing::info!(chat_id, row = ?row.values(), "Data saved");
                true
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "Error saving to sheet");
                false
            }
        }
    }

    fn set_state(&self, chat_id: ChatId, state: ChatState) {
        let mut session = self.sessions.get(chat_id);
        session.state = state;
        self.sessions.put(chat_id, session);
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.api.send_message(chat_id, text).await {
            tracing::warn!(chat_id, error = %e, "Failed to send reply");
        }
    }
}

/// Quantity as typed by the user: an optionally signed integer.
pub fn parse_quantity(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}
