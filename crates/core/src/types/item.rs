//! Order line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One purchased position inside an order.
///
/// Items are embedded in the order row as a JSON array, so an order and its
/// items are always written atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product title as submitted on the site.
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    /// Number of units; defaults to 1 when the field is absent.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Optional stock keeping unit from the site catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl LineItem {
    /// Total for this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals over a set of items.
#[must_use]
pub fn items_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}
