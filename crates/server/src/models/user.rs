//! Chat user model.

use chrono::{DateTime, Utc};

use tilda_bridge_core::{ChatId, UserRole};

/// Identity of a person interacting via chat.
///
/// Exactly one row per platform identity; created on first contact and
/// never deleted in normal operation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Telegram id (primary key).
    pub chat_id: ChatId,
    /// Telegram username, when the profile exposes one.
    pub username: Option<String>,
    /// Display name.
    pub first_name: String,
    /// Normalized phone, once the user has shared it.
    pub phone: Option<String>,
    /// `client` or `operator`.
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
