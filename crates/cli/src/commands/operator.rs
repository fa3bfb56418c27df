//! Operator management command.

use secrecy::SecretString;
use thiserror::Error;

use tilda_bridge_core::ChatId;
use tilda_bridge_server::db::{self, RepositoryError, UserRepository};

/// Errors granting the operator role.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("user {0} has never contacted the bot; ask them to /start it first")]
    UnknownUser(i64),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Grant the operator role to an existing chat user.
///
/// # Errors
///
/// Returns `OperatorError::UnknownUser` when no row exists for the chat id;
/// the user has to message the bot once before they can be promoted.
pub async fn grant(chat_id: i64) -> Result<(), OperatorError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BRIDGE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| OperatorError::MissingEnvVar("BRIDGE_DATABASE_URL"))?;

    let pool = db::create_pool(&SecretString::from(database_url)).await?;

    let user = UserRepository::new(&pool)
        .grant_operator(ChatId::new(chat_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => OperatorError::UnknownUser(chat_id),
            other => OperatorError::Repository(other),
        })?;

    tracing::info!(chat_id = %user.chat_id, name = %user.first_name, "operator role granted");
    Ok(())
}
