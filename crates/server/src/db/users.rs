//! Chat user repository.

use sqlx::PgPool;
use tracing::info;

use tilda_bridge_core::{ChatId, UserRole};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str = "chat_id, username, first_name, phone, role, created_at, updated_at";

/// Repository for chat user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by platform identity, creating the row on first contact.
    ///
    /// Existing rows only gain data: the username and name are filled in
    /// when previously empty, never overwritten. Safe under concurrent
    /// first contact thanks to the upsert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
        first_name: &str,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (chat_id, username, first_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (chat_id) DO UPDATE \
             SET username = COALESCE(users.username, EXCLUDED.username), \
                 first_name = CASE WHEN users.first_name = '' \
                              THEN EXCLUDED.first_name ELSE users.first_name END, \
                 updated_at = now() \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(chat_id)
            .bind(username)
            .bind(first_name)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by platform identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, chat_id: ChatId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(chat_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by normalized phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Store a user's confirmed phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the user does not exist.
    pub async fn update_phone(&self, chat_id: ChatId, phone: &str) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET phone = $2, updated_at = now() \
             WHERE chat_id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(chat_id)
            .bind(phone)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        info!(chat_id = %chat_id, "user phone updated");
        Ok(user)
    }

    /// Promote a user to the operator role. Used by the CLI.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the user does not exist.
    pub async fn grant_operator(&self, chat_id: ChatId) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() \
             WHERE chat_id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(chat_id)
            .bind(UserRole::Operator)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        info!(chat_id = %chat_id, "user granted operator role");
        Ok(user)
    }
}
