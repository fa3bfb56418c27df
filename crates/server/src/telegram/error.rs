//! Telegram client errors.

use thiserror::Error;

/// Errors from the Telegram Bot API client.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed before a response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Response(String),

    /// The Bot API answered with `ok: false`.
    #[error("telegram api error: {0}")]
    Api(String),
}
