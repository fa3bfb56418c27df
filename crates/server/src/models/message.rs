//! Relayed chat message model.

use chrono::{DateTime, Utc};

use tilda_bridge_core::{ChatId, MessageDirection, OrderId, StoredMessageId};

/// One relayed operator↔client message. Append-only; never mutated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredMessage {
    pub id: StoredMessageId,
    /// Order the conversation belongs to.
    pub order_id: OrderId,
    /// Chat user who sent the message.
    pub sender_id: ChatId,
    pub text: String,
    pub direction: MessageDirection,
    pub created_at: DateTime<Utc>,
}
