//! Operator-side chat flow.
//!
//! Operator input is stateless: every action is one command (or one
//! inline-keyboard press) carrying the order id, and each maps 1:1 to a
//! lifecycle event or a message relay.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use tilda_bridge_core::{ChatId, MessageDirection, OrderId};

use super::{answer, reply};
use crate::db::{MessageRepository, OrderRepository, UserRepository};
use crate::error::AppError;
use crate::models::Order;
use crate::services::{Notifier, OrderFlowService};
use crate::state::AppState;
use crate::telegram::{
    CallbackAction, CallbackQuery, IncomingMessage, ReplyMarkup, operator_order_keyboard,
    order_card_text, status_label,
};

const HELP_TEXT: &str = "👨‍💼 <b>Команды оператора</b>\n\n\
     /orders — новые заказы\n\
     /order &lt;id&gt; — карточка заказа\n\
     /delivery &lt;id&gt; &lt;стоимость&gt; — рассчитать доставку\n\
     /pay &lt;id&gt; &lt;ссылка&gt; — отправить ссылку на оплату\n\
     /paid &lt;id&gt; — подтвердить оплату\n\
     /track &lt;id&gt; &lt;ссылка&gt; — отправить трекинг\n\
     /done &lt;id&gt; — завершить заказ\n\
     /cancel &lt;id&gt; — отменить заказ\n\
     /reply &lt;id&gt; &lt;текст&gt; — написать клиенту\n\
     /history &lt;id&gt; — переписка по заказу";

pub(super) async fn handle_message(
    state: &AppState,
    message: &IncomingMessage,
) -> Result<(), AppError> {
    let chat = ChatId::new(message.chat.id);
    let Some(text) = message
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    else {
        return Ok(());
    };

    let (command, rest) = split_command(text);
    let result = match command {
        "/start" | "/operator" | "/help" => {
            reply(state, chat, HELP_TEXT, None).await;
            Ok(())
        }
        "/orders" => list_new_orders(state, chat).await,
        "/order" => show_order(state, chat, rest).await,
        "/delivery" => set_delivery(state, chat, rest).await,
        "/pay" => issue_payment_link(state, chat, rest).await,
        "/paid" => confirm_payment_command(state, chat, rest).await,
        "/track" => issue_tracking_link(state, chat, rest).await,
        "/done" => complete_command(state, chat, rest).await,
        "/cancel" => cancel_command(state, chat, rest).await,
        "/reply" => relay_to_client(state, chat, rest).await,
        "/history" => show_history(state, chat, rest).await,
        _ => {
            reply(
                state,
                chat,
                "Неизвестная команда. /help — список команд.",
                None,
            )
            .await;
            Ok(())
        }
    };

    // Domain-level failures become chat replies; real failures propagate.
    match result {
        Err(AppError::NotFound(_)) => {
            reply(state, chat, "❌ Заказ не найден", None).await;
            Ok(())
        }
        Err(AppError::InvalidTransition(e)) => {
            warn!(error = %e, "operator command rejected");
            reply(state, chat, &format!("⚠️ Недопустимый переход: {e}"), None).await;
            Ok(())
        }
        Err(AppError::Validation(message)) => {
            reply(state, chat, &format!("⚠️ {message}"), None).await;
            Ok(())
        }
        other => other,
    }
}

pub(super) async fn handle_callback(
    state: &AppState,
    query: &CallbackQuery,
    action: CallbackAction,
) -> Result<(), AppError> {
    let chat = ChatId::new(query.from.id);

    let result = match action {
        CallbackAction::OperatorView(order_id) => {
            let order = load(state, order_id).await?;
            answer(state, &query.id, None, false).await;
            send_operator_card(state, chat, &order).await;
            Ok(())
        }
        CallbackAction::OperatorPaid(order_id) => match mark_paid(state, order_id).await {
            Ok(order) => {
                answer(state, &query.id, Some("Оплата подтверждена"), false).await;
                send_operator_card(state, chat, &order).await;
                Ok(())
            }
            Err(e) => Err(e),
        },
        CallbackAction::OperatorDone(order_id) => match mark_done(state, order_id).await {
            Ok(order) => {
                answer(state, &query.id, Some("Заказ завершён"), false).await;
                send_operator_card(state, chat, &order).await;
                Ok(())
            }
            Err(e) => Err(e),
        },
        CallbackAction::OperatorCancel(order_id) => match mark_cancelled(state, order_id).await {
            Ok(order) => {
                answer(state, &query.id, Some("Заказ отменён"), false).await;
                send_operator_card(state, chat, &order).await;
                Ok(())
            }
            Err(e) => Err(e),
        },
        _ => Ok(()),
    };

    match result {
        Err(AppError::NotFound(_)) => {
            answer(state, &query.id, Some("Заказ не найден"), true).await;
            Ok(())
        }
        Err(AppError::InvalidTransition(e)) => {
            warn!(error = %e, "operator callback rejected");
            answer(state, &query.id, Some("Недопустимый переход"), true).await;
            Ok(())
        }
        other => other,
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn list_new_orders(state: &AppState, chat: ChatId) -> Result<(), AppError> {
    let orders = OrderRepository::new(state.pool()).list_new(20).await?;

    if orders.is_empty() {
        reply(state, chat, "✅ Нет новых заказов!", None).await;
        return Ok(());
    }

    let mut text = format!("🆕 <b>Новых заказов: {}</b>\n\n", orders.len());
    for order in &orders {
        text.push_str(&format!(
            "<code>{}</code> — {}, {}₽, {}\n",
            order.external_order_id,
            order.customer_name,
            order.base_amount,
            status_label(order.status)
        ));
    }
    text.push_str("\nКарточка заказа: /order &lt;id&gt;");

    reply(state, chat, &text, None).await;
    Ok(())
}

async fn show_order(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, _) = id_and_value(rest)?;
    let order = find_order(state, external_id).await?;
    send_operator_card(state, chat, &order).await;
    Ok(())
}

async fn set_delivery(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, raw_cost) = id_and_value(rest)?;
    let cost = Decimal::from_str(raw_cost.trim()).map_err(|_| {
        AppError::Validation("укажите стоимость доставки числом: /delivery <id> <стоимость>".into())
    })?;

    let order = find_order(state, external_id).await?;
    let updated = OrderFlowService::new(state.pool())
        .set_delivery_cost(order.id, cost)
        .await?;

    reply(
        state,
        chat,
        &format!(
            "🚚 Доставка по заказу <code>{}</code>: {cost}₽, к оплате {}₽",
            updated.external_order_id,
            updated.amount_due()
        ),
        None,
    )
    .await;
    Ok(())
}

async fn issue_payment_link(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, link) = id_and_value(rest)?;
    if link.is_empty() {
        return Err(AppError::Validation(
            "укажите ссылку на оплату: /pay <id> <ссылка>".into(),
        ));
    }

    let order = find_order(state, external_id).await?;
    let updated = OrderFlowService::new(state.pool())
        .issue_payment_link(order.id, link)
        .await?;

    Notifier::new(state)
        .client_text(
            &updated,
            &format!(
                "💳 <b>Заказ готов к оплате!</b>\n\n\
                 К оплате: <b>{}₽</b>\n\nОплатите по ссылке: {link}",
                updated.amount_due()
            ),
            None,
        )
        .await;

    reply(
        state,
        chat,
        &format!(
            "✅ Ссылка на оплату отправлена клиенту по заказу <code>{}</code>",
            updated.external_order_id
        ),
        None,
    )
    .await;
    Ok(())
}

async fn confirm_payment_command(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, _) = id_and_value(rest)?;
    let order = find_order(state, external_id).await?;
    let updated = mark_paid(state, order.id).await?;
    send_operator_card(state, chat, &updated).await;
    Ok(())
}

async fn issue_tracking_link(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, link) = id_and_value(rest)?;
    if link.is_empty() {
        return Err(AppError::Validation(
            "укажите ссылку на трекинг: /track <id> <ссылка>".into(),
        ));
    }

    let order = find_order(state, external_id).await?;
    let updated = OrderFlowService::new(state.pool())
        .issue_tracking_link(order.id, link)
        .await?;

    Notifier::new(state)
        .client_text(
            &updated,
            &format!(
                "🚚 <b>Заказ передан в доставку!</b>\n\nСледите за курьером: {link}"
            ),
            None,
        )
        .await;

    reply(
        state,
        chat,
        &format!(
            "✅ Трекинг отправлен клиенту по заказу <code>{}</code>",
            updated.external_order_id
        ),
        None,
    )
    .await;
    Ok(())
}

async fn complete_command(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, _) = id_and_value(rest)?;
    let order = find_order(state, external_id).await?;
    let updated = mark_done(state, order.id).await?;
    send_operator_card(state, chat, &updated).await;
    Ok(())
}

async fn cancel_command(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, _) = id_and_value(rest)?;
    let order = find_order(state, external_id).await?;
    let updated = mark_cancelled(state, order.id).await?;
    send_operator_card(state, chat, &updated).await;
    Ok(())
}

async fn relay_to_client(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, text) = id_and_value(rest)?;
    if text.is_empty() {
        return Err(AppError::Validation(
            "укажите текст сообщения: /reply <id> <текст>".into(),
        ));
    }

    let order = find_order(state, external_id).await?;
    if order.user_id.is_none() {
        return Err(AppError::Validation(
            "клиент ещё не открыл заказ в боте".into(),
        ));
    }

    MessageRepository::new(state.pool())
        .save(order.id, chat, text, MessageDirection::ToClient)
        .await?;

    Notifier::new(state)
        .client_text(
            &order,
            &format!("💬 <b>Сообщение от оператора</b>\n\n{text}"),
            None,
        )
        .await;

    reply(state, chat, "✅ Сообщение отправлено клиенту", None).await;
    Ok(())
}

async fn show_history(state: &AppState, chat: ChatId, rest: &str) -> Result<(), AppError> {
    let (external_id, _) = id_and_value(rest)?;
    let order = find_order(state, external_id).await?;

    let messages = MessageRepository::new(state.pool())
        .list_for_order(order.id)
        .await?;
    if messages.is_empty() {
        reply(state, chat, "История переписки пуста", None).await;
        return Ok(());
    }

    let users = UserRepository::new(state.pool());
    let mut text = format!(
        "💬 <b>Переписка по заказу {}</b>\n\n",
        order.external_order_id
    );
    for message in &messages {
        let sender = users.get_by_id(message.sender_id).await?;
        let name = sender.map_or_else(|| message.sender_id.to_string(), |user| user.first_name);
        let direction = match message.direction {
            MessageDirection::ToClient => "→ клиенту",
            MessageDirection::ToOperator => "→ оператору",
        };
        text.push_str(&format!("{name} ({direction}): {}\n", message.text));
    }

    reply(state, chat, &text, None).await;
    Ok(())
}

// =============================================================================
// Shared lifecycle actions (used by commands and callbacks)
// =============================================================================

async fn mark_paid(state: &AppState, order_id: OrderId) -> Result<Order, AppError> {
    let updated = OrderFlowService::new(state.pool())
        .confirm_payment(order_id)
        .await?;
    Notifier::new(state)
        .client_text(
            &updated,
            "✅ <b>Оплата получена!</b>\n\nГотовим заказ к доставке.",
            None,
        )
        .await;
    Ok(updated)
}

async fn mark_done(state: &AppState, order_id: OrderId) -> Result<Order, AppError> {
    let updated = OrderFlowService::new(state.pool()).complete(order_id).await?;
    Notifier::new(state)
        .client_text(
            &updated,
            "🎉 <b>Заказ доставлен!</b>\n\nСпасибо, что выбрали нас.",
            None,
        )
        .await;
    Ok(updated)
}

async fn mark_cancelled(state: &AppState, order_id: OrderId) -> Result<Order, AppError> {
    let updated = OrderFlowService::new(state.pool()).cancel(order_id).await?;
    Notifier::new(state)
        .client_text(&updated, "❌ Ваш заказ отменён.", None)
        .await;
    Ok(updated)
}

// =============================================================================
// Helpers
// =============================================================================

async fn load(state: &AppState, order_id: OrderId) -> Result<Order, AppError> {
    OrderRepository::new(state.pool())
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
}

async fn find_order(state: &AppState, external_id: &str) -> Result<Order, AppError> {
    OrderRepository::new(state.pool())
        .get_by_external_id(external_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {external_id}")))
}

async fn send_operator_card(state: &AppState, chat: ChatId, order: &Order) {
    reply(
        state,
        chat,
        &order_card_text(order, true),
        Some(ReplyMarkup::Inline(operator_order_keyboard(order))),
    )
    .await;
}

fn split_command(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    }
}

fn id_and_value(rest: &str) -> Result<(&str, &str), AppError> {
    let (id, value) = match rest.split_once(char::is_whitespace) {
        Some((id, value)) => (id, value.trim()),
        None => (rest, ""),
    };
    if id.is_empty() {
        return Err(AppError::Validation("укажите номер заказа".into()));
    }
    Ok((id, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_splitting() {
        assert_eq!(split_command("/orders"), ("/orders", ""));
        assert_eq!(
            split_command("/pay 123 https://pay.example/1"),
            ("/pay", "123 https://pay.example/1")
        );
    }

    #[test]
    fn id_and_value_parsing() {
        assert_eq!(
            id_and_value("123 https://pay.example/1").expect("parse"),
            ("123", "https://pay.example/1")
        );
        assert_eq!(id_and_value("123").expect("parse"), ("123", ""));
        assert!(id_and_value("").is_err());
    }

    #[test]
    fn reply_text_keeps_the_rest_intact() {
        let (id, text) = id_and_value("77 Ваш заказ уже готовится, курьер выехал").expect("parse");
        assert_eq!(id, "77");
        assert_eq!(text, "Ваш заказ уже готовится, курьер выехал");
    }
}
