//! Telegram bot that registers inventory assets from barcode photos into
//! Google Sheets.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod scanner;
pub mod sheets;
pub mod telegram;
pub mod utils;
