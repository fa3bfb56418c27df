//! Telegram Bot API client.
//!
//! Constructed once in `main` from configuration and injected via
//! application state; components that send messages receive it explicitly.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use tilda_bridge_core::ChatId;

use super::error::TelegramError;
use super::types::{AnswerCallbackQuery, ApiResponse, ReplyMarkup, SendMessage, SentMessage};

/// Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Client for sending messages and answering callback queries.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// Bot token for authentication (part of every request URL).
    bot_token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("bot_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new Telegram client.
    #[must_use]
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            bot_token,
        }
    }

    /// Call one Bot API method and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T, TelegramError> {
        let url = format!(
            "{TELEGRAM_API_BASE}/bot{}/{method}",
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.to_string()))?;

        let result: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Response(e.to_string()))?;

        if !result.ok {
            error!(
                method = %method,
                error = ?result.description,
                "Telegram API error"
            );
            return Err(TelegramError::Api(
                result
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        result
            .result
            .ok_or_else(|| TelegramError::Response("missing result payload".to_string()))
    }

    /// Send an HTML-formatted message to a chat.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    #[instrument(skip(self, text, reply_markup), fields(chat_id = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage, TelegramError> {
        let payload = SendMessage {
            chat_id: chat_id.as_i64(),
            text: text.to_string(),
            parse_mode: "HTML",
            reply_markup,
        };

        let sent: SentMessage = self.call("sendMessage", &payload).await?;
        debug!(message_id = sent.message_id, "message sent");
        Ok(sent)
    }

    /// Acknowledge an inline-keyboard press, optionally showing a toast.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or Telegram returns an error.
    #[instrument(skip(self, text))]
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<bool, TelegramError> {
        let payload = AnswerCallbackQuery {
            callback_query_id: callback_query_id.to_string(),
            text: text.map(String::from),
            show_alert,
        };

        self.call("answerCallbackQuery", &payload).await
    }
}
