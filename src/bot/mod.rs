//! Conversation module.
//!
//! Commands, per-chat sessions, the message handler and the per-chat
//! dispatcher that feeds it.

pub mod commands;
pub mod dispatcher;
pub mod handler;
pub mod messages;
pub mod state;

pub use commands::Command;
pub use dispatcher::Dispatcher;
pub use handler::{parse_quantity, Bot};
pub use state::{ChatState, ItemDraft, Session, SessionStore};
