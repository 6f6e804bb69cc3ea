//! Telegram Bot API objects.
//!
//! Only the fields the bot reads are modeled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::bot::Command;

/// Telegram chat identifier.
pub type ChatId = i64;

/// Envelope every Bot API method answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra information about a failed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// Incoming update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Message sent to the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// What a message carries, as far as the bot is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent<'a> {
    Command(Command),
    Text(&'a str),
    /// File id of the image to scan.
    Image(&'a str),
    Other,
}

impl Message {
    /// Classifies the message. Known commands win over plain text, photos
    /// over everything else.
    pub fn content(&self) -> MessageContent<'_> {
        if let Some(file_id) = self.image_file_id() {
            return MessageContent::Image(file_id);
        }

        match self.text.as_deref() {
            Some(text) => Command::parse(text)
                .map_or(MessageContent::Text(text), MessageContent::Command),
            None => MessageContent::Other,
        }
    }

    /// Largest photo size, which Telegram always sends last.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo.as_ref().and_then(|sizes| sizes.last())
    }

    /// File id of the attached image: a photo, or a document with an
    /// `image/*` MIME type (photos sent "as file").
    pub fn image_file_id(&self) -> Option<&str> {
        if let Some(photo) = self.largest_photo() {
            return Some(&photo.file_id);
        }

        self.document
            .as_ref()
            .filter(|doc| doc.is_image())
            .map(|doc| doc.file_id.as_str())
    }
}

/// Chat the message belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Telegram user or bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// One size of a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// General file attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl Document {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// File ready to be downloaded.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// `sendMessage` parameters.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
}

/// `getUpdates` parameters.
#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

/// `setWebhook` parameters.
#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    pub secret_token: &'a str,
    pub allowed_updates: Vec<&'static str>,
    pub drop_pending_updates: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_from(json: serde_json::Value) -> Message {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_update_deserialize_text_message() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "date": 1700000000,
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Aysel"},
                    "text": "Printer HP"
                }
            }"#,
        )
        .unwrap();

        let message = update.message.unwrap();
        assert_eq!(update.update_id, 10);
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.content(), MessageContent::Text("Printer HP"));
    }

    #[test]
    fn test_update_without_message() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 3, "edited_message": {"x": 1}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_content_command() {
        let message = message_from(serde_json::json!({
            "message_id": 1, "chat": {"id": 1}, "text": "/start"
        }));
        assert_eq!(message.content(), MessageContent::Command(Command::Start));
    }

    #[test]
    fn test_content_unknown_command_is_text() {
        let message = message_from(serde_json::json!({
            "message_id": 1, "chat": {"id": 1}, "text": "/stats"
        }));
        assert_eq!(message.content(), MessageContent::Text("/stats"));
    }

    #[test]
    fn test_content_photo_uses_largest_size() {
        let message = message_from(serde_json::json!({
            "message_id": 1,
            "chat": {"id": 1},
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 60},
                {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960}
            ],
            "caption": "/manual"
        }));
        assert_eq!(message.content(), MessageContent::Image("large"));
    }

    #[test]
    fn test_content_image_document() {
        let message = message_from(serde_json::json!({
            "message_id": 1,
            "chat": {"id": 1},
            "document": {"file_id": "doc", "mime_type": "image/jpeg", "file_name": "a.jpg"}
        }));
        assert_eq!(message.content(), MessageContent::Image("doc"));
    }

    #[test]
    fn test_content_non_image_document() {
        let message = message_from(serde_json::json!({
            "message_id": 1,
            "chat": {"id": 1},
            "document": {"file_id": "doc", "mime_type": "application/pdf"}
        }));
        assert_eq!(message.content(), MessageContent::Other);
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<bool> = serde_json::from_str(
            r#"{"ok": false, "error_code": 429, "description": "Too Many Requests",
                "parameters": {"retry_after": 5}}"#,
        )
        .unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.parameters.unwrap().retry_after, Some(5));
    }
}
