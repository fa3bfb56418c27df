//! Customer-side chat flow.
//!
//! The flow is linear and fully determined by the persisted order status:
//! deep link → confirm details → share phone → wait for the operator.
//! Free text outside that flow is relayed to the operator.

use tracing::warn;

use tilda_bridge_core::{ChatId, MessageDirection, OrderStatus, phone};

use super::{answer, reply};
use crate::db::{MessageRepository, OrderRepository};
use crate::error::AppError;
use crate::models::{Order, User};
use crate::services::{Notifier, OrderFlowService};
use crate::state::AppState;
use crate::telegram::{
    CallbackAction, CallbackQuery, IncomingMessage, ReplyKeyboardRemove, ReplyMarkup,
    client_order_keyboard, contact_request_keyboard, order_card_text,
};

const WELCOME_TEXT: &str = "👋 <b>Добро пожаловать в Chang Cafe!</b>\n\n\
     Здесь вы можете отследить свой заказ и связаться с оператором.\n\
     Если у вас есть ссылка на заказ — откройте её, и заказ появится в этом чате.";

pub(super) async fn handle_message(
    state: &AppState,
    user: &User,
    message: &IncomingMessage,
) -> Result<(), AppError> {
    let chat = ChatId::new(message.chat.id);

    // A shared contact is always a phone confirmation attempt.
    if let Some(contact) = &message.contact {
        return confirm_phone(state, user, chat, &contact.phone_number).await;
    }

    let text = message.text.as_deref().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(());
    }

    if let Some(args) = text.strip_prefix("/start") {
        return start(state, user, chat, args.trim()).await;
    }

    // A phone typed as text counts as confirmation while the active order
    // is waiting for one.
    if looks_like_phone(text)
        && let Some(order) = active_order(state, user.chat_id).await?
        && order.status == OrderStatus::AwaitingConfirmation
    {
        return confirm_phone(state, user, chat, text).await;
    }

    relay_to_operator(state, user, chat, text).await
}

pub(super) async fn handle_callback(
    state: &AppState,
    query: &CallbackQuery,
    action: CallbackAction,
) -> Result<(), AppError> {
    let chat = ChatId::new(query.from.id);
    let repo = OrderRepository::new(state.pool());
    let flow = OrderFlowService::new(state.pool());

    let order_id = match action {
        CallbackAction::ClientConfirm(id) | CallbackAction::ClientCancel(id) => id,
        _ => return Ok(()),
    };

    let Some(order) = repo.get_by_id(order_id).await? else {
        answer(state, &query.id, Some("Заказ не найден"), true).await;
        return Ok(());
    };
    if order.user_id != Some(chat) {
        answer(state, &query.id, Some("Это не ваш заказ"), true).await;
        return Ok(());
    }

    match action {
        CallbackAction::ClientConfirm(_) => match flow.confirm_details(order_id).await {
            Ok(_) => {
                answer(state, &query.id, Some("Заказ подтверждён"), false).await;
                reply(
                    state,
                    chat,
                    "📞 <b>Подтвердите ваш номер телефона</b>\n\n\
                     Отправьте номер текстом или поделитесь контактом кнопкой ниже 👇",
                    Some(ReplyMarkup::Keyboard(contact_request_keyboard())),
                )
                .await;
            }
            Err(AppError::InvalidTransition(e)) => {
                warn!(error = %e, "client confirm rejected");
                answer(state, &query.id, Some("Заказ уже подтверждён"), true).await;
            }
            Err(e) => return Err(e),
        },
        CallbackAction::ClientCancel(_) => match flow.cancel(order_id).await {
            Ok(cancelled) => {
                answer(state, &query.id, Some("Заказ отменён"), false).await;
                reply(state, chat, "❌ Заказ отменён.", None).await;
                Notifier::new(state)
                    .operator_text(&format!(
                        "❌ Клиент отменил заказ <code>{}</code>",
                        cancelled.external_order_id
                    ))
                    .await;
            }
            Err(AppError::InvalidTransition(e)) => {
                warn!(error = %e, "client cancel rejected");
                answer(state, &query.id, Some("Заказ уже закрыт"), true).await;
            }
            Err(e) => return Err(e),
        },
        _ => {}
    }

    Ok(())
}

/// `/start` with an optional `order_<external_id>` deep-link payload.
async fn start(state: &AppState, user: &User, chat: ChatId, args: &str) -> Result<(), AppError> {
    if let Some(external_id) = args.strip_prefix("order_") {
        let repo = OrderRepository::new(state.pool());
        let Some(mut order) = repo.get_by_external_id(external_id).await? else {
            reply(
                state,
                chat,
                "❌ Заказ не найден.\n\nПроверьте ссылку или обратитесь в поддержку.",
                None,
            )
            .await;
            return Ok(());
        };

        // First open claims the order for this chat user.
        if order.user_id.is_none() {
            order = repo.attach_user(order.id, user.chat_id).await?;
        }

        show_order(state, chat, &order).await;
        return Ok(());
    }

    reply(state, chat, WELCOME_TEXT, None).await;
    Ok(())
}

async fn show_order(state: &AppState, chat: ChatId, order: &Order) {
    reply(
        state,
        chat,
        &order_card_text(order, false),
        Some(ReplyMarkup::Inline(client_order_keyboard(order))),
    )
    .await;
}

async fn confirm_phone(
    state: &AppState,
    user: &User,
    chat: ChatId,
    raw_phone: &str,
) -> Result<(), AppError> {
    let Some(order) = active_order(state, user.chat_id).await? else {
        reply(
            state,
            chat,
            "У вас нет активного заказа. Откройте ссылку на заказ, чтобы привязать его.",
            None,
        )
        .await;
        return Ok(());
    };

    if raw_phone.chars().filter(char::is_ascii_digit).count() < 10 {
        reply(state, chat, "❌ Номер слишком короткий. Попробуйте ещё раз.", None).await;
        return Ok(());
    }

    let flow = OrderFlowService::new(state.pool());
    match flow.confirm_phone(order.id, user.chat_id, raw_phone).await {
        Ok(updated) => {
            reply(
                state,
                chat,
                "✅ Номер подтверждён!\n\n\
                 Оператор рассчитает доставку и пришлёт ссылку на оплату.",
                Some(ReplyMarkup::Remove(ReplyKeyboardRemove {
                    remove_keyboard: true,
                })),
            )
            .await;
            let mut operator_note = format!(
                "☎️ Клиент подтвердил номер по заказу <code>{}</code>\n\n{}",
                updated.external_order_id,
                order_card_text(&updated, true)
            );
            if !updated.customer_phone.is_empty()
                && !phone::phones_match(&updated.customer_phone, raw_phone)
            {
                operator_note.push_str("\n⚠️ Номер отличается от указанного в заказе");
            }
            Notifier::new(state).operator_text(&operator_note).await;
        }
        Err(AppError::InvalidTransition(e)) => {
            warn!(error = %e, "phone confirmation rejected");
            reply(
                state,
                chat,
                "⚠️ Заказ сейчас не ждёт подтверждения номера.",
                None,
            )
            .await;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Append the text to the relay log and forward it to the operator.
async fn relay_to_operator(
    state: &AppState,
    user: &User,
    chat: ChatId,
    text: &str,
) -> Result<(), AppError> {
    let Some(order) = active_order(state, user.chat_id).await? else {
        reply(state, chat, WELCOME_TEXT, None).await;
        return Ok(());
    };

    MessageRepository::new(state.pool())
        .save(order.id, user.chat_id, text, MessageDirection::ToOperator)
        .await?;

    Notifier::new(state)
        .operator_text(&format!(
            "💬 <b>Сообщение от клиента</b>\n\n\
             Заказ: <code>{}</code>\nОт: {}\n\n{text}",
            order.external_order_id, user.first_name
        ))
        .await;

    reply(
        state,
        chat,
        "✅ Сообщение отправлено оператору. Ответ придёт в этот чат 📬",
        None,
    )
    .await;
    Ok(())
}

async fn active_order(state: &AppState, user_id: ChatId) -> Result<Option<Order>, AppError> {
    Ok(OrderRepository::new(state.pool())
        .latest_active_for_user(user_id)
        .await?)
}

fn looks_like_phone(text: &str) -> bool {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    digits >= 10 && text.chars().all(|c| !c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_detection() {
        assert!(looks_like_phone("+7 999 123 45 67"));
        assert!(looks_like_phone("89991234567"));
        assert!(!looks_like_phone("позвоните мне 89991234567"));
        assert!(!looks_like_phone("привет"));
        assert!(!looks_like_phone("123"));
    }
}
