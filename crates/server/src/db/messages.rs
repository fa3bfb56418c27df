//! Relay message repository. Append-only; rows are never mutated.

use sqlx::PgPool;

use tilda_bridge_core::{ChatId, MessageDirection, OrderId};

use super::RepositoryError;
use crate::models::StoredMessage;

const MESSAGE_COLUMNS: &str = "id, order_id, sender_id, text, direction, created_at";

/// Repository for the operator↔client relay log.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a relayed message to the log.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn save(
        &self,
        order_id: OrderId,
        sender_id: ChatId,
        text: &str,
        direction: MessageDirection,
    ) -> Result<StoredMessage, RepositoryError> {
        let sql = format!(
            "INSERT INTO messages (order_id, sender_id, text, direction) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let message = sqlx::query_as::<_, StoredMessage>(&sql)
            .bind(order_id)
            .bind(sender_id)
            .bind(text)
            .bind(direction)
            .fetch_one(self.pool)
            .await?;
        Ok(message)
    }

    /// Full conversation history for an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE order_id = $1 ORDER BY created_at ASC"
        );
        let messages = sqlx::query_as::<_, StoredMessage>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?;
        Ok(messages)
    }
}
