//! Message and keyboard builders for the operator and client chats.
//!
//! Everything here is pure string/struct building; sending happens in the
//! notification service and the update handlers.

use tilda_bridge_core::{OrderId, OrderStatus};

use super::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
};
use crate::models::Order;

/// Human-readable status label with its emoji, as shown in chat.
#[must_use]
pub const fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::New => "🆕 Новый",
        OrderStatus::AwaitingConfirmation => "⏳ Ждёт подтверждения",
        OrderStatus::WaitingOperator => "👨‍💼 Ждёт оператора",
        OrderStatus::AwaitingPayment => "💳 Ожидает оплаты",
        OrderStatus::Paid => "✅ Оплачен",
        OrderStatus::InDelivery => "🚚 В доставке",
        OrderStatus::Completed => "✅ Доставлен",
        OrderStatus::Cancelled => "❌ Отменён",
    }
}

/// Render the deterministic multi-line order summary.
///
/// The operator variant additionally shows the current status and, when
/// present, the phone the customer confirmed in chat.
#[must_use]
pub fn order_card_text(order: &Order, for_operator: bool) -> String {
    let mut text = format!("📦 <b>Заказ {}</b>\n\n", order.external_order_id);

    text.push_str(&format!("👤 {}\n", order.customer_name));
    if !order.customer_phone.is_empty() {
        text.push_str(&format!("📞 {}\n", order.customer_phone));
    }
    if !order.address.is_empty() {
        text.push_str(&format!("📍 {}\n", order.address));
    }

    if !order.items.is_empty() {
        text.push('\n');
        for item in &order.items {
            text.push_str(&format!(
                "• {} x{} — {}₽\n",
                item.title,
                item.quantity,
                item.line_total()
            ));
        }
    }

    text.push_str(&format!("\n💰 Итого: {}₽\n", order.base_amount));
    if let Some(delivery_cost) = order.delivery_cost {
        text.push_str(&format!("🚚 Доставка: {delivery_cost}₽\n"));
    }
    if let Some(total_amount) = order.total_amount {
        text.push_str(&format!("💳 К оплате: <b>{total_amount}₽</b>\n"));
    }

    if for_operator {
        text.push_str(&format!("\n📊 Статус: {}\n", status_label(order.status)));
        if let Some(confirmed_phone) = &order.confirmed_phone {
            text.push_str(&format!("☎️ Подтверждённый номер: {confirmed_phone}\n"));
        }
    }

    text
}

/// Keyboard attached to the "new order" operator notification.
#[must_use]
pub fn operator_notification_keyboard(order_id: OrderId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback(
                "📦 Взять заказ",
                format!("op_view:{order_id}"),
            )],
            vec![InlineKeyboardButton::callback(
                "❌ Отклонить",
                format!("op_cancel:{order_id}"),
            )],
        ],
    }
}

/// Context-dependent action keyboard under the operator's order card.
#[must_use]
pub fn operator_order_keyboard(order: &Order) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if order.status == OrderStatus::AwaitingPayment {
        rows.push(vec![InlineKeyboardButton::callback(
            "✅ Оплата получена",
            format!("op_paid:{}", order.id),
        )]);
    }
    if order.status == OrderStatus::InDelivery {
        rows.push(vec![InlineKeyboardButton::callback(
            "🏁 Доставлен",
            format!("op_done:{}", order.id),
        )]);
    }
    if !order.status.is_terminal() {
        rows.push(vec![InlineKeyboardButton::callback(
            "❌ Отменить",
            format!("op_cancel:{}", order.id),
        )]);
    }

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// Context-dependent keyboard under the customer's order card.
#[must_use]
pub fn client_order_keyboard(order: &Order) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if order.status == OrderStatus::New {
        rows.push(vec![InlineKeyboardButton::callback(
            "✅ Подтвердить заказ",
            format!("cl_confirm:{}", order.id),
        )]);
    }
    if order.status == OrderStatus::InDelivery
        && let Some(tracking_link) = &order.tracking_link
    {
        rows.push(vec![InlineKeyboardButton::link(
            "🔗 Отследить доставку",
            tracking_link.clone(),
        )]);
    }
    if !order.status.is_terminal() {
        rows.push(vec![InlineKeyboardButton::callback(
            "❌ Отменить заказ",
            format!("cl_cancel:{}", order.id),
        )]);
    }

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// One-button reply keyboard asking the customer to share their phone.
#[must_use]
pub fn contact_request_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup {
        keyboard: vec![vec![KeyboardButton {
            text: "📱 Отправить номер".to_string(),
            request_contact: true,
        }]],
        resize_keyboard: true,
        one_time_keyboard: true,
    }
}

/// Parsed inline-keyboard callback, one variant per flow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Customer confirms the order details.
    ClientConfirm(OrderId),
    /// Customer cancels the order.
    ClientCancel(OrderId),
    /// Operator opens the order card.
    OperatorView(OrderId),
    /// Operator confirms payment arrived.
    OperatorPaid(OrderId),
    /// Operator marks the order delivered.
    OperatorDone(OrderId),
    /// Operator cancels the order.
    OperatorCancel(OrderId),
}

/// Parse callback data produced by the keyboards above.
#[must_use]
pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    let (action, raw_id) = data.split_once(':')?;
    let id = OrderId::new(raw_id.parse().ok()?);

    match action {
        "cl_confirm" => Some(CallbackAction::ClientConfirm(id)),
        "cl_cancel" => Some(CallbackAction::ClientCancel(id)),
        "op_view" => Some(CallbackAction::OperatorView(id)),
        "op_paid" => Some(CallbackAction::OperatorPaid(id)),
        "op_done" => Some(CallbackAction::OperatorDone(id)),
        "op_cancel" => Some(CallbackAction::OperatorCancel(id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tilda_bridge_core::LineItem;

    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(3),
            external_order_id: "2067628905".to_string(),
            user_id: None,
            customer_name: "Иван".to_string(),
            customer_phone: "+79991234567".to_string(),
            address: "ул. Ленина, д. 10".to_string(),
            items: vec![LineItem {
                title: "Pizza".to_string(),
                price: Decimal::from(690),
                quantity: 1,
                sku: None,
            }],
            base_amount: Decimal::from(690),
            confirmed_phone: None,
            delivery_cost: None,
            total_amount: None,
            payment_link: None,
            tracking_link: None,
            status,
            created_at: Utc::now(),
            confirmed_at: None,
            paid_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn card_lists_items_and_total() {
        let text = order_card_text(&order(OrderStatus::New), false);
        assert!(text.contains("• Pizza x1 — 690₽"));
        assert!(text.contains("Итого: 690₽"));
        assert!(text.contains("2067628905"));
    }

    #[test]
    fn operator_card_appends_status_and_confirmed_phone() {
        let mut order = order(OrderStatus::WaitingOperator);
        order.confirmed_phone = Some("+79991234567".to_string());

        let text = order_card_text(&order, true);
        assert!(text.contains("Статус"));
        assert!(text.contains("Ждёт оператора"));
        assert!(text.contains("Подтверждённый номер: +79991234567"));

        let client_text = order_card_text(&order, false);
        assert!(!client_text.contains("Статус"));
    }

    #[test]
    fn card_shows_delivery_and_grand_total_once_priced() {
        let mut order = order(OrderStatus::WaitingOperator);
        order.delivery_cost = Some(Decimal::from(200));
        order.total_amount = Some(Decimal::from(890));

        let text = order_card_text(&order, false);
        assert!(text.contains("Доставка: 200₽"));
        assert!(text.contains("890₽"));
    }

    #[test]
    fn client_keyboard_matches_status() {
        let confirm = client_order_keyboard(&order(OrderStatus::New));
        let data: Vec<_> = confirm
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| b.callback_data.as_deref())
            .collect();
        assert!(data.contains(&"cl_confirm:3"));
        assert!(data.contains(&"cl_cancel:3"));

        let terminal = client_order_keyboard(&order(OrderStatus::Completed));
        assert!(terminal.inline_keyboard.is_empty());
    }

    #[test]
    fn tracking_button_appears_in_delivery() {
        let mut in_delivery = order(OrderStatus::InDelivery);
        in_delivery.tracking_link = Some("https://go.example/track/1".to_string());

        let keyboard = client_order_keyboard(&in_delivery);
        let has_url = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .any(|b| b.url.as_deref() == Some("https://go.example/track/1"));
        assert!(has_url);
    }

    #[test]
    fn operator_keyboard_offers_paid_only_when_awaiting_payment() {
        let keyboard = operator_order_keyboard(&order(OrderStatus::AwaitingPayment));
        let data: Vec<_> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| b.callback_data.as_deref())
            .collect();
        assert!(data.contains(&"op_paid:3"));
        assert!(!data.contains(&"op_done:3"));
    }

    #[test]
    fn callback_roundtrip() {
        let keyboard = operator_notification_keyboard(OrderId::new(3));
        let first = keyboard
            .inline_keyboard
            .first()
            .and_then(|row| row.first())
            .and_then(|b| b.callback_data.as_deref())
            .expect("callback data");
        assert_eq!(
            parse_callback(first),
            Some(CallbackAction::OperatorView(OrderId::new(3)))
        );
    }

    #[test]
    fn malformed_callback_data_is_rejected() {
        assert_eq!(parse_callback("op_view"), None);
        assert_eq!(parse_callback("op_view:abc"), None);
        assert_eq!(parse_callback("unknown:1"), None);
    }
}
