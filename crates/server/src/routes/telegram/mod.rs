//! Telegram bot update webhook.
//!
//! Telegram pushes updates here; they are dispatched to the client or
//! operator handlers. Failures inside dispatch are logged and answered
//! with 200 so Telegram does not redeliver the same update indefinitely.
//! Every handler action corresponds 1:1 to an order lifecycle event or a
//! message relay.

mod client;
mod operator;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use secrecy::ExposeSecret;
use tracing::{debug, error, instrument};

use tilda_bridge_core::{ChatId, UserRole};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::telegram::{CallbackAction, CallbackQuery, ReplyMarkup, Update, parse_callback};

/// Create Telegram webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/telegram/updates", post(handle_update))
}

/// Handle one pushed bot update.
#[instrument(skip_all, fields(update_id = update.update_id))]
async fn handle_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<StatusCode, AppError> {
    verify_secret_token(&state, &headers)?;

    if let Err(e) = dispatch(&state, update).await {
        error!(error = %e, "failed to process telegram update");
    }

    // Always 200 once authenticated; redelivery would not help.
    Ok(StatusCode::OK)
}

/// Check the secret token Telegram echoes back on every webhook call.
/// Skipped when none is configured.
fn verify_secret_token(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(secret) = state
        .config()
        .telegram()
        .and_then(|telegram| telegram.webhook_secret.as_ref())
    else {
        return Ok(());
    };

    let provided = headers
        .get("X-Telegram-Bot-Api-Secret-Token")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if provided != secret.expose_secret() {
        return Err(AppError::Forbidden(
            "invalid bot webhook secret".to_string(),
        ));
    }
    Ok(())
}

async fn dispatch(state: &AppState, update: Update) -> Result<(), AppError> {
    if let Some(query) = update.callback_query {
        return handle_callback(state, query).await;
    }
    if let Some(message) = update.message {
        let Some(sender) = message.from.clone() else {
            return Ok(());
        };
        if sender.is_bot {
            return Ok(());
        }

        let user = UserRepository::new(state.pool())
            .get_or_create(
                ChatId::new(sender.id),
                sender.username.as_deref(),
                &sender.first_name,
            )
            .await?;

        if is_operator(state, &user) {
            return operator::handle_message(state, &message).await;
        }
        return client::handle_message(state, &user, &message).await;
    }

    debug!("ignoring unsupported update type");
    Ok(())
}

async fn handle_callback(state: &AppState, query: CallbackQuery) -> Result<(), AppError> {
    let Some(action) = query.data.as_deref().and_then(parse_callback) else {
        answer(state, &query.id, Some("Неизвестное действие"), false).await;
        return Ok(());
    };

    let user = UserRepository::new(state.pool())
        .get_or_create(
            ChatId::new(query.from.id),
            query.from.username.as_deref(),
            &query.from.first_name,
        )
        .await?;

    match action {
        CallbackAction::ClientConfirm(_) | CallbackAction::ClientCancel(_) => {
            client::handle_callback(state, &query, action).await
        }
        CallbackAction::OperatorView(_)
        | CallbackAction::OperatorPaid(_)
        | CallbackAction::OperatorDone(_)
        | CallbackAction::OperatorCancel(_) => {
            if !is_operator(state, &user) {
                answer(state, &query.id, Some("Недостаточно прав"), true).await;
                return Ok(());
            }
            operator::handle_callback(state, &query, action).await
        }
    }
}

/// Whether a chat user is the operator: either by role or by being the
/// statically-configured operator chat.
fn is_operator(state: &AppState, user: &User) -> bool {
    user.role == UserRole::Operator
        || state
            .config()
            .telegram()
            .is_some_and(|telegram| telegram.operator_chat_id == user.chat_id)
}

/// Best-effort interactive reply; failures are logged, never propagated.
pub(crate) async fn reply(state: &AppState, chat: ChatId, text: &str, markup: Option<ReplyMarkup>) {
    let Some(client) = state.telegram() else {
        debug!("telegram not configured, dropping reply");
        return;
    };
    if let Err(e) = client.send_message(chat, text, markup).await {
        error!(chat = %chat, error = %e, "failed to send chat reply");
    }
}

/// Best-effort callback acknowledgement.
pub(crate) async fn answer(state: &AppState, callback_id: &str, text: Option<&str>, alert: bool) {
    let Some(client) = state.telegram() else {
        return;
    };
    if let Err(e) = client.answer_callback_query(callback_id, text, alert).await {
        error!(error = %e, "failed to answer callback query");
    }
}
