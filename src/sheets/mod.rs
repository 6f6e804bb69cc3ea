//! Google Sheets 모듈.

pub mod auth;
pub mod client;
pub mod row;

use async_trait::async_trait;

use crate::error::AppResult;

pub use auth::GoogleAuth;
pub use client::SheetsClient;
pub use row::InventoryRow;

/// Destination of registered items.
#[async_trait]
pub trait RowSink: Send + Sync {
    async fn append(&self, row: &InventoryRow) -> AppResult<()>;
}
