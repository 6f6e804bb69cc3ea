//! Spreadsheet row model.

use chrono::{DateTime, Local};
use serde_json::{json, Value};

use crate::bot::messages::{NO_BARCODE, NO_DESCRIPTION};
use crate::bot::ItemDraft;

/// Timestamp format of the first column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One registered asset: `[timestamp, barcode, description, quantity]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRow {
    pub timestamp: String,
    pub barcode: String,
    pub description: String,
    pub quantity: i64,
}

impl InventoryRow {
    /// Fills missing draft fields with placeholders.
    pub fn from_draft(draft: &ItemDraft, at: DateTime<Local>) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            barcode: draft
                .barcode
                .clone()
                .unwrap_or_else(|| NO_BARCODE.to_string()),
            description: draft
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            quantity: draft.quantity.unwrap_or(0),
        }
    }

    /// Cell values in column order.
    pub fn values(&self) -> Value {
        json!([self.timestamp, self.barcode, self.description, self.quantity])
    }
}
