//! Order repository.
//!
//! All mutating operations are single-row read-modify-return. Racing status
//! writes on the same order are last-write-wins; there is no version column.

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::info;

use tilda_bridge_core::{ChatId, LineItem, OrderId, OrderStatus};

use super::RepositoryError;
use crate::ingest::WebhookOrder;
use crate::models::Order;

/// Column list shared by every query returning a full order row.
const ORDER_COLUMNS: &str = "id, external_order_id, user_id, customer_name, customer_phone, \
     address, items, base_amount, confirmed_phone, delivery_cost, total_amount, \
     payment_link, tracking_link, status, created_at, confirmed_at, paid_at, completed_at";

/// Internal row type for order queries; items decode from JSONB.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    external_order_id: String,
    user_id: Option<ChatId>,
    customer_name: String,
    customer_phone: String,
    address: String,
    items: Json<Vec<LineItem>>,
    base_amount: rust_decimal::Decimal,
    confirmed_phone: Option<String>,
    delivery_cost: Option<rust_decimal::Decimal>,
    total_amount: Option<rust_decimal::Decimal>,
    payment_link: Option<String>,
    tracking_link: Option<String>,
    status: OrderStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    confirmed_at: Option<chrono::DateTime<chrono::Utc>>,
    paid_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            external_order_id: row.external_order_id,
            user_id: row.user_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            address: row.address,
            items: row.items.0,
            base_amount: row.base_amount,
            confirmed_phone: row.confirmed_phone,
            delivery_cost: row.delivery_cost,
            total_amount: row.total_amount,
            payment_link: row.payment_link,
            tracking_link: row.tracking_link,
            status: row.status,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            paid_at: row.paid_at,
            completed_at: row.completed_at,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order from a webhook payload at status `new`.
    ///
    /// The items array is embedded in the row, so the order and its items
    /// are written atomically or not at all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the external order id
    /// already exists (concurrent duplicate delivery); `Database` otherwise.
    pub async fn create_from_webhook(
        &self,
        payload: &WebhookOrder,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "INSERT INTO orders \
                 (external_order_id, customer_name, customer_phone, address, items, base_amount) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORDER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&payload.external_id)
            .bind(&payload.name)
            .bind(&payload.phone)
            .bind(&payload.address)
            .bind(Json(&payload.items))
            .bind(payload.base_amount)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "order {} already exists",
                        payload.external_id
                    ));
                }
                RepositoryError::Database(e)
            })?;

        info!(external_order_id = %payload.external_id, "order created from webhook");
        Ok(row.into())
    }

    /// Get an order by the id assigned by Tilda.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_external_id(
        &self,
        external_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE external_order_id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(external_order_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Get an order by its internal id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// List the newest orders still at status `new`, for the operator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_new(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status = $1 ORDER BY created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(OrderStatus::New)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most recent non-terminal order claimed by a chat user.
    ///
    /// Drives the linear chat flow: the customer's next input applies to
    /// this order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_active_for_user(
        &self,
        user_id: ChatId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND status <> $2 AND status <> $3 \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .bind(OrderStatus::Completed)
            .bind(OrderStatus::Cancelled)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Attach a chat user to an order without touching its status.
    ///
    /// Used when the customer opens the deep link, before any confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn attach_user(
        &self,
        id: OrderId,
        user_id: ChatId,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders SET user_id = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Link a chat user with their confirmed phone and advance the order to
    /// `waiting_operator`, stamping `confirmed_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn link_user(
        &self,
        id: OrderId,
        user_id: ChatId,
        confirmed_phone: &str,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders \
             SET user_id = $2, confirmed_phone = $3, status = $4, confirmed_at = now() \
             WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(confirmed_phone)
            .bind(OrderStatus::WaitingOperator)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        info!(order_id = %id, user_id = %user_id, "order linked to chat user");
        Ok(row.into())
    }

    /// Set the delivery cost and recompute the total. No status change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn set_delivery_cost(
        &self,
        id: OrderId,
        delivery_cost: rust_decimal::Decimal,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders \
             SET delivery_cost = $2, total_amount = base_amount + $2 \
             WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(delivery_cost)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Store the payment link and advance the order to `awaiting_payment`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn set_payment_link(
        &self,
        id: OrderId,
        payment_link: &str,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders SET payment_link = $2, status = $3 \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(payment_link)
            .bind(OrderStatus::AwaitingPayment)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Store the tracking link and advance the order to `in_delivery`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn set_tracking_link(
        &self,
        id: OrderId,
        tracking_link: &str,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders SET tracking_link = $2, status = $3 \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(tracking_link)
            .bind(OrderStatus::InDelivery)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Unconditional status overwrite, stamping the matching timestamp for
    /// `paid` and `completed`. Transition legality is the flow service's
    /// responsibility, not this method's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders \
             SET status = $2, \
                 paid_at = CASE WHEN $2 = 'paid'::order_status THEN now() ELSE paid_at END, \
                 completed_at = CASE WHEN $2 = 'completed'::order_status \
                                THEN now() ELSE completed_at END \
             WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        info!(order_id = %id, status = %status, "order status updated");
        Ok(row.into())
    }
}
