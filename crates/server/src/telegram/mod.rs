//! Telegram Bot API integration.
//!
//! Provides a thin typed client over the Bot API plus builders for the
//! order cards and keyboards used in the operator and client chats.

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use messages::{
    CallbackAction, client_order_keyboard, contact_request_keyboard, operator_notification_keyboard,
    operator_order_keyboard, order_card_text, parse_callback, status_label,
};
pub use types::{
    AnswerCallbackQuery, ApiResponse, CallbackQuery, Chat, Contact, IncomingMessage,
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
    ReplyKeyboardRemove, ReplyMarkup, SendMessage, Sender, SentMessage, Update,
};
