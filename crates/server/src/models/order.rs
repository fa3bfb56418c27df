//! Order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tilda_bridge_core::{ChatId, LineItem, OrderId, OrderStatus, items_total};

/// One externally-sourced purchase.
///
/// Created by webhook ingestion at [`OrderStatus::New`], mutated only
/// through the order flow service, never physically deleted.
#[derive(Debug, Clone)]
pub struct Order {
    /// Internal sequential id.
    pub id: OrderId,
    /// Id assigned by Tilda; the idempotency key for webhook replays.
    pub external_order_id: String,
    /// Chat user who claimed the order, once one has.
    pub user_id: Option<ChatId>,
    /// Customer name as submitted on the site.
    pub customer_name: String,
    /// Customer phone as submitted on the site.
    pub customer_phone: String,
    /// Delivery address assembled from the webhook fields.
    pub address: String,
    /// Ordered line items.
    pub items: Vec<LineItem>,
    /// Sum of line items, without delivery.
    pub base_amount: Decimal,
    /// Phone confirmed by the customer in chat.
    pub confirmed_phone: Option<String>,
    /// Delivery cost set by the operator.
    pub delivery_cost: Option<Decimal>,
    /// `base_amount + delivery_cost`, once delivery is priced.
    pub total_amount: Option<Decimal>,
    /// Payment link issued by the operator.
    pub payment_link: Option<String>,
    /// Delivery tracking link issued by the operator.
    pub tracking_link: Option<String>,
    /// Current lifecycle status.
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of line totals over the embedded items.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        items_total(&self.items)
    }

    /// Amount the customer is expected to pay: the full total when
    /// delivery has been priced, the base amount otherwise.
    #[must_use]
    pub fn amount_due(&self) -> Decimal {
        self.total_amount.unwrap_or(self.base_amount)
    }
}
