//! Integration tests for webhook ingestion and phone canonicalization.
//!
//! These drive the ingest module through the same payload shapes Tilda
//! actually delivers and pin the documented parsing contract.

use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

use tilda_bridge_core::{items_total, phone};
use tilda_bridge_server::ingest::{self, IngestError};

fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

// =============================================================================
// Form payloads
// =============================================================================

#[test]
fn test_realistic_tilda_form_payload() {
    let order = ingest::from_fields(&form(&[
        ("formid", "2067628905"),
        ("name", "Иван Петров"),
        ("phone", "8 (999) 123-45-67"),
        ("street", "ул. Ленина"),
        ("home", "10"),
        ("amount", "3010"),
        ("payment[0][title]", "Пицца Маргарита"),
        ("payment[0][price]", "690"),
        ("payment[0][quantity]", "1"),
        ("payment[0][sku]", "PZ-01"),
        ("payment[1][title]", "Кола"),
        ("payment[1][price]", "160"),
        ("payment[1][quantity]", "2"),
    ]))
    .expect("valid payload");

    assert_eq!(order.external_id, "2067628905");
    assert_eq!(order.address, "ул. Ленина, д. 10");
    assert_eq!(order.base_amount, Decimal::from(3010));
    assert_eq!(order.items.len(), 2);
    assert_eq!(
        order.items.first().and_then(|i| i.sku.as_deref()),
        Some("PZ-01")
    );
    assert_eq!(items_total(&order.items), Decimal::from(1010));
}

#[test]
fn test_four_indexed_items_are_all_collected() {
    let mut pairs = vec![("formid".to_owned(), "1".to_owned())];
    for (i, (price, quantity)) in [(100, 1), (250, 2), (90, 3), (60, 1)].iter().enumerate() {
        pairs.push((format!("payment[{i}][title]"), format!("Позиция {i}")));
        pairs.push((format!("payment[{i}][price]"), price.to_string()));
        pairs.push((format!("payment[{i}][quantity]"), quantity.to_string()));
    }
    let fields: BTreeMap<String, String> = pairs.into_iter().collect();

    let order = ingest::from_fields(&fields).expect("valid payload");
    assert_eq!(order.items.len(), 4);
    // 100*1 + 250*2 + 90*3 + 60*1
    assert_eq!(items_total(&order.items), Decimal::from(930));
}

#[test]
fn test_missing_order_identifier_is_rejected() {
    let err = ingest::from_fields(&form(&[
        ("name", "Иван"),
        ("phone", "+79991234567"),
        ("amount", "690"),
    ]))
    .expect_err("must fail without formid");
    assert_eq!(err, IngestError::MissingOrderId);
}

// =============================================================================
// JSON payloads
// =============================================================================

#[test]
fn test_json_payload_with_order_items() {
    let order = ingest::from_json(&json!({
        "orderId": "555",
        "customerName": "Анна",
        "customerPhone": "+79990001122",
        "orderPrice": 1540,
        "orderItems": [
            {"title": "Том Ям", "price": 590, "quantity": 2},
            {"title": "Рис", "price": 180, "quantity": 2},
        ],
    }))
    .expect("valid json payload");

    assert_eq!(order.external_id, "555");
    assert_eq!(order.name, "Анна");
    assert_eq!(order.base_amount, Decimal::from(1540));
    assert_eq!(items_total(&order.items), Decimal::from(1540));
}

#[test]
fn test_json_payload_without_identifier_is_rejected() {
    let err = ingest::from_json(&json!({"customerName": "Анна"})).expect_err("must fail");
    assert_eq!(err, IngestError::MissingOrderId);
}

// =============================================================================
// Phone canonicalization (matching rules used when claiming orders)
// =============================================================================

#[test]
fn test_normalize_rewrites_trunk_prefix() {
    assert_eq!(phone::normalize("89991234567"), "+79991234567");
    assert_eq!(phone::normalize("+7 999 123 45 67"), "+79991234567");
}

#[test]
fn test_normalize_is_idempotent() {
    for raw in ["89991234567", "+7 (999) 123-45-67", "tel: 8-912-000", ""] {
        let once = phone::normalize(raw);
        assert_eq!(phone::normalize(&once), once);
    }
}

#[test]
fn test_phones_match_across_representations() {
    assert!(phone::phones_match("79991234567", "+79991234567"));
    assert!(phone::phones_match("8 999 123-45-67", "+7 999 123 45 67"));
    assert!(!phone::phones_match("+79991234567", "+79991234500"));
}

#[test]
fn test_webhook_phone_matches_contact_phone_after_normalization() {
    // The site submits the trunk form, Telegram shares the international
    // form; claiming an order relies on these matching.
    let order = ingest::from_fields(&form(&[("formid", "7"), ("phone", "8 (999) 123-45-67")]))
        .expect("valid payload");
    assert!(phone::phones_match(&order.phone, "+79991234567"));
}
