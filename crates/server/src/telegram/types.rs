//! Wire types for the Telegram Bot API.
//!
//! Only the fields this service reads are modeled; Telegram sends many
//! more, which serde ignores.

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming update types
// =============================================================================

/// One incoming update delivered to the bot webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

/// The account a message or callback came from.
#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A shared phone contact.
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

// =============================================================================
// Outgoing request types
// =============================================================================

/// Payload for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Payload for `answerCallbackQuery`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub show_alert: bool,
}

/// Any of the keyboard attachments `sendMessage` accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// One inline keyboard button: either a callback or a URL button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that fires a callback query with the given data.
    #[must_use]
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// A button that opens a URL.
    #[must_use]
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// Custom reply keyboard shown under the input field.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

/// One reply keyboard button.
#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub request_contact: bool,
}

/// Removes a previously shown reply keyboard.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

// =============================================================================
// Response envelope
// =============================================================================

/// Standard Bot API response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The message object returned by `sendMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_contact_deserializes() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "from": {"id": 42, "first_name": "Иван", "username": "ivan"},
                    "chat": {"id": 42},
                    "contact": {"phone_number": "+79991234567", "user_id": 42}
                }
            }"#,
        )
        .expect("deserialize");

        let message = update.message.expect("message");
        let contact = message.contact.expect("contact");
        assert_eq!(contact.phone_number, "+79991234567");
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn callback_query_deserializes() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 11,
                "callback_query": {
                    "id": "77",
                    "from": {"id": 42, "first_name": "Иван"},
                    "message": {"message_id": 5, "chat": {"id": 42}},
                    "data": "cl_confirm:3"
                }
            }"#,
        )
        .expect("deserialize");

        let query = update.callback_query.expect("callback");
        assert_eq!(query.data.as_deref(), Some("cl_confirm:3"));
        assert_eq!(query.from.id, 42);
    }

    #[test]
    fn url_buttons_omit_callback_data() {
        let button = InlineKeyboardButton::link("Track", "https://example.com/t/1");
        let json = serde_json::to_value(&button).expect("serialize");
        assert!(json.get("callback_data").is_none());
        assert_eq!(
            json.get("url").and_then(serde_json::Value::as_str),
            Some("https://example.com/t/1")
        );
    }

    #[test]
    fn send_message_omits_missing_markup() {
        let payload = SendMessage {
            chat_id: 42,
            text: "hi".to_string(),
            parse_mode: "HTML",
            reply_markup: None,
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert!(json.get("reply_markup").is_none());
    }
}
