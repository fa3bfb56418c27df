//! Webhook payload parsing.
//!
//! Tilda posts orders either as flat form fields (multipart or urlencoded)
//! with positional item keys like `payment[0][title]`, or as a JSON object
//! that may carry an `orderItems` array instead. Both shapes reduce to one
//! canonical [`WebhookOrder`]. Parsing is pure; persistence happens in the
//! route.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use tilda_bridge_core::LineItem;

/// Canonical order record extracted from a webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOrder {
    /// Order id assigned by Tilda (`formid`/`orderId`).
    pub external_id: String,
    /// Customer name; `"Guest"` when the field is absent.
    pub name: String,
    /// Customer phone as submitted.
    pub phone: String,
    /// Street/building/apartment joined into one string.
    pub address: String,
    /// Line items.
    pub items: Vec<LineItem>,
    /// Order amount without delivery.
    pub base_amount: Decimal,
}

/// Webhook payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Neither `formid` nor `orderId` carried a value.
    #[error("missing order identifier (formid/orderId)")]
    MissingOrderId,
}

/// Parse a flat string-keyed field map (multipart or urlencoded body).
///
/// # Errors
///
/// Returns [`IngestError::MissingOrderId`] when the order id is absent.
pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<WebhookOrder, IngestError> {
    let external_id = first(fields, &["formid", "orderId"])
        .filter(|value| !value.is_empty())
        .ok_or(IngestError::MissingOrderId)?
        .to_owned();

    let name = first(fields, &["name", "customerName"])
        .unwrap_or("Guest")
        .to_owned();
    let phone = first(fields, &["phone", "customerPhone"])
        .unwrap_or_default()
        .to_owned();

    let address = build_address(
        fields.get("street").map(String::as_str),
        fields.get("home").map(String::as_str),
        fields.get("apartment").map(String::as_str),
    );

    let base_amount = first(fields, &["amount", "orderPrice"])
        .and_then(parse_decimal)
        .unwrap_or_default();

    Ok(WebhookOrder {
        external_id,
        name,
        phone,
        address,
        items: indexed_items(fields),
        base_amount,
    })
}

/// Parse a JSON webhook body.
///
/// Scalar top-level fields are treated exactly like form fields; an
/// `orderItems` array, when present, replaces positional item keys.
/// Malformed entries inside `orderItems` are skipped, matching the
/// per-item tolerance of the form path.
///
/// # Errors
///
/// Returns [`IngestError::MissingOrderId`] when the order id is absent.
pub fn from_json(value: &Value) -> Result<WebhookOrder, IngestError> {
    let mut fields = BTreeMap::new();
    if let Some(object) = value.as_object() {
        for (key, field) in object {
            match field {
                Value::String(s) => {
                    fields.insert(key.clone(), s.clone());
                }
                Value::Number(n) => {
                    fields.insert(key.clone(), n.to_string());
                }
                _ => {}
            }
        }
    }

    let mut order = from_fields(&fields)?;

    if let Some(items) = value.get("orderItems").and_then(Value::as_array) {
        order.items = items
            .iter()
            .filter_map(|item| serde_json::from_value::<LineItem>(item.clone()).ok())
            .collect();
    }

    Ok(order)
}

/// First non-missing value among aliased field names.
fn first<'a>(fields: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| fields.get(*key))
        .map(String::as_str)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Join street, building and apartment into one display address.
/// Empty parts are omitted; the apartment segment only appears when given.
fn build_address(street: Option<&str>, home: Option<&str>, apartment: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(street) = street.filter(|s| !s.trim().is_empty()) {
        parts.push(street.trim().to_owned());
    }
    if let Some(home) = home.filter(|s| !s.trim().is_empty()) {
        parts.push(format!("д. {}", home.trim()));
    }
    if let Some(apartment) = apartment.filter(|s| !s.trim().is_empty()) {
        parts.push(format!("кв. {}", apartment.trim()));
    }
    parts.join(", ")
}

/// Collect items addressed by `payment[<i>][field]` keys, incrementing the
/// index until the title key is missing. Price defaults to 0 on a
/// missing/unparseable value, quantity to 1.
fn indexed_items(fields: &BTreeMap<String, String>) -> Vec<LineItem> {
    let mut items = Vec::new();
    for index in 0.. {
        let Some(title) = fields.get(&format!("payment[{index}][title]")) else {
            break;
        };
        let price = fields
            .get(&format!("payment[{index}][price]"))
            .and_then(|value| parse_decimal(value))
            .unwrap_or_default();
        let quantity = fields
            .get(&format!("payment[{index}][quantity]"))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(1);
        let sku = fields
            .get(&format!("payment[{index}][sku]"))
            .filter(|value| !value.is_empty())
            .cloned();

        items.push(LineItem {
            title: title.clone(),
            price,
            quantity,
            sku,
        });
    }
    items
}
