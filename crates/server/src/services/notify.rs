//! Operator and client notifications.
//!
//! Sends are best-effort: failures are logged and swallowed so a chat
//! outage never blocks or rolls back the order mutation that triggered
//! the notification. Nothing here retries.

use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::models::Order;
use crate::state::AppState;
use crate::telegram::{
    ReplyMarkup, TelegramClient, operator_notification_keyboard, order_card_text,
};

/// Best-effort notification sender over the configured Telegram client.
pub struct Notifier<'a> {
    telegram: Option<(&'a TelegramClient, &'a TelegramConfig)>,
}

impl<'a> Notifier<'a> {
    /// Build a notifier from application state. When the bot is not
    /// configured every send becomes a no-op.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            telegram: state.telegram().zip(state.config().telegram()),
        }
    }

    /// Tell the operator a new order arrived, with the order card, a deep
    /// link for the customer, and the take/decline keyboard.
    pub async fn operator_new_order(&self, order: &Order) {
        let Some((client, config)) = self.telegram else {
            debug!("telegram not configured, skipping operator notification");
            return;
        };

        let deep_link = config.deep_link(&order.external_order_id);
        let text = format!(
            "🔔 <b>Новый заказ!</b>\n\n{}\n🔗 Ссылка для клиента: {deep_link}",
            order_card_text(order, true)
        );

        match client
            .send_message(
                config.operator_chat_id,
                &text,
                Some(ReplyMarkup::Inline(operator_notification_keyboard(order.id))),
            )
            .await
        {
            Ok(_) => info!(order_id = %order.id, "operator notified of new order"),
            Err(e) => {
                error!(order_id = %order.id, error = %e, "failed to notify operator of new order");
            }
        }
    }

    /// Send a plain text to the operator chat.
    pub async fn operator_text(&self, text: &str) {
        let Some((client, config)) = self.telegram else {
            debug!("telegram not configured, skipping operator notification");
            return;
        };

        if let Err(e) = client
            .send_message(config.operator_chat_id, text, None)
            .await
        {
            error!(error = %e, "failed to send operator notification");
        }
    }

    /// Send a text to the customer who claimed the order. A no-op when no
    /// chat user is linked yet.
    pub async fn client_text(&self, order: &Order, text: &str, markup: Option<ReplyMarkup>) {
        let Some((client, _)) = self.telegram else {
            debug!("telegram not configured, skipping client notification");
            return;
        };
        let Some(user_id) = order.user_id else {
            debug!(order_id = %order.id, "order has no linked user, skipping client notification");
            return;
        };

        if let Err(e) = client.send_message(user_id, text, markup).await {
            error!(order_id = %order.id, error = %e, "failed to send client notification");
        }
    }
}
