//! Integration tests for Telegram order cards and keyboards.
//!
//! These verify the exact text and keyboard structure the bot sends for
//! various order states.

use chrono::Utc;
use rust_decimal::Decimal;

use tilda_bridge_core::{ChatId, LineItem, OrderId, OrderStatus};
use tilda_bridge_server::models::Order;
use tilda_bridge_server::telegram::{
    CallbackAction, client_order_keyboard, operator_notification_keyboard, operator_order_keyboard,
    order_card_text, parse_callback,
};

fn sample_order(status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(1),
        external_order_id: "2067628905".to_string(),
        user_id: Some(ChatId::new(123_456_789)),
        customer_name: "Иван".to_string(),
        customer_phone: "+79991234567".to_string(),
        address: "ул. Ленина, д. 10, кв. 5".to_string(),
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

// =============================================================================
// Order Card Tests
// =============================================================================

#[test]
fn test_card_contains_itemized_line_and_total() {
    let text = order_card_text(&sample_order(OrderStatus::New), false);

    assert!(text.contains("• Pizza x1 — 690₽"), "itemized line: {text}");
    let total_line = text
        .lines()
        .find(|line| line.contains("Итого"))
        .expect("total line");
    assert!(total_line.contains("690"));
}

#[test]
fn test_card_is_deterministic() {
    let order = sample_order(OrderStatus::New);
    assert_eq!(order_card_text(&order, true), order_card_text(&order, true));
}

#[test]
fn test_card_quantity_multiplies_line_total() {
    let mut order = sample_order(OrderStatus::New);
    order.items = vec![LineItem {
        title: "Кола".to_string(),
        price: Decimal::from(120),
        quantity: 3,
        sku: None,
    }];

    let text = order_card_text(&order, false);
    assert!(text.contains("• Кола x3 — 360₽"));
}

#[test]
fn test_operator_variant_adds_status_and_confirmed_phone() {
    let mut order = sample_order(OrderStatus::WaitingOperator);
    order.confirmed_phone = Some("+79991234567".to_string());

    let operator_text = order_card_text(&order, true);
    assert!(operator_text.contains("Статус"));
    assert!(operator_text.contains("+79991234567"));

    let client_text = order_card_text(&order, false);
    assert!(!client_text.contains("Статус"));
}

#[test]
fn test_card_shows_name_phone_and_address() {
    let text = order_card_text(&sample_order(OrderStatus::New), false);
    assert!(text.contains("Иван"));
    assert!(text.contains("+79991234567"));
    assert!(text.contains("ул. Ленина, д. 10, кв. 5"));
}

// =============================================================================
// Keyboard Tests
// =============================================================================

fn callback_actions(keyboard: &tilda_bridge_server::telegram::InlineKeyboardMarkup) -> Vec<CallbackAction> {
    keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| button.callback_data.as_deref())
        .filter_map(parse_callback)
        .collect()
}

#[test]
fn test_notification_keyboard_round_trips_through_parser() {
    let actions = callback_actions(&operator_notification_keyboard(OrderId::new(1)));
    assert_eq!(
        actions,
        vec![
            CallbackAction::OperatorView(OrderId::new(1)),
            CallbackAction::OperatorCancel(OrderId::new(1)),
        ]
    );
}

#[test]
fn test_every_operator_button_maps_to_a_lifecycle_action() {
    for status in [
        OrderStatus::New,
        OrderStatus::WaitingOperator,
        OrderStatus::AwaitingPayment,
        OrderStatus::InDelivery,
    ] {
        let keyboard = operator_order_keyboard(&sample_order(status));
        for button in keyboard.inline_keyboard.iter().flatten() {
            let data = button.callback_data.as_deref().expect("callback button");
            assert!(parse_callback(data).is_some(), "unparseable: {data}");
        }
    }
}

#[test]
fn test_client_keyboard_per_status() {
    let new = callback_actions(&client_order_keyboard(&sample_order(OrderStatus::New)));
    assert!(new.contains(&CallbackAction::ClientConfirm(OrderId::new(1))));

    let waiting = callback_actions(&client_order_keyboard(&sample_order(
        OrderStatus::WaitingOperator,
    )));
    assert!(!waiting.contains(&CallbackAction::ClientConfirm(OrderId::new(1))));
    assert!(waiting.contains(&CallbackAction::ClientCancel(OrderId::new(1))));

    let done = client_order_keyboard(&sample_order(OrderStatus::Completed));
    assert!(done.inline_keyboard.is_empty());
}

#[test]
fn test_tracking_button_is_a_url_button() {
    let mut order = sample_order(OrderStatus::InDelivery);
    order.tracking_link = Some("https://go.example/track/42".to_string());

    let keyboard = client_order_keyboard(&order);
    let serialized = serde_json::to_string(&keyboard).expect("serialize");
    assert!(serialized.contains("https://go.example/track/42"));
    // URL buttons must not carry callback_data alongside the url.
    let url_button = keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .find(|button| button.url.is_some())
        .expect("url button");
    assert!(url_button.callback_data.is_none());
}
