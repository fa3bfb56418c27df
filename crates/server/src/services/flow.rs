//! Order flow service.
//!
//! The single choke point for status mutation: every operation loads the
//! order, validates the move against the lifecycle table, then performs the
//! matching repository write. Nothing else in the codebase changes an
//! order's status.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use tilda_bridge_core::{ChatId, OrderEvent, OrderId, OrderStatus, apply, phone};

use crate::db::{OrderRepository, UserRepository};
use crate::error::AppError;
use crate::models::Order;

/// Drives orders through their lifecycle.
pub struct OrderFlowService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderFlowService<'a> {
    /// Create a new flow service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, AppError> {
        OrderRepository::new(self.pool)
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
    }

    /// Validate one lifecycle event against the order's current status.
    fn next_status(order: &Order, event: OrderEvent) -> Result<OrderStatus, AppError> {
        Ok(apply(order.status, event)?)
    }

    /// Customer confirmed the order details in chat: `new →
    /// awaiting_confirmation`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self))]
    pub async fn confirm_details(&self, order_id: OrderId) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        let next = Self::next_status(&order, OrderEvent::DetailsSubmitted)?;
        let updated = OrderRepository::new(self.pool)
            .update_status(order_id, next)
            .await?;
        Ok(updated)
    }

    /// Customer confirmed their phone: links the chat user, stores the
    /// normalized phone on both the order and the user, and advances
    /// `awaiting_confirmation → waiting_operator`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self, raw_phone))]
    pub async fn confirm_phone(
        &self,
        order_id: OrderId,
        user_id: ChatId,
        raw_phone: &str,
    ) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        Self::next_status(&order, OrderEvent::PhoneConfirmed)?;

        let confirmed = phone::normalize(raw_phone);
        let updated = OrderRepository::new(self.pool)
            .link_user(order_id, user_id, &confirmed)
            .await?;
        UserRepository::new(self.pool)
            .update_phone(user_id, &confirmed)
            .await?;

        info!(order_id = %order_id, "phone confirmed, waiting for operator");
        Ok(updated)
    }

    /// Operator priced delivery. Data-only update, no lifecycle event.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order.
    #[instrument(skip(self))]
    pub async fn set_delivery_cost(
        &self,
        order_id: OrderId,
        cost: Decimal,
    ) -> Result<Order, AppError> {
        let updated = OrderRepository::new(self.pool)
            .set_delivery_cost(order_id, cost)
            .await?;
        Ok(updated)
    }

    /// Operator issued a payment link: `waiting_operator →
    /// awaiting_payment`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self, link))]
    pub async fn issue_payment_link(
        &self,
        order_id: OrderId,
        link: &str,
    ) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        Self::next_status(&order, OrderEvent::PaymentLinkIssued)?;
        let updated = OrderRepository::new(self.pool)
            .set_payment_link(order_id, link)
            .await?;
        Ok(updated)
    }

    /// Operator confirmed the payment: `awaiting_payment → paid`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        let next = Self::next_status(&order, OrderEvent::PaymentConfirmed)?;
        let updated = OrderRepository::new(self.pool)
            .update_status(order_id, next)
            .await?;
        Ok(updated)
    }

    /// Operator issued a tracking link: `paid → in_delivery`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self, link))]
    pub async fn issue_tracking_link(
        &self,
        order_id: OrderId,
        link: &str,
    ) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        Self::next_status(&order, OrderEvent::TrackingLinkIssued)?;
        let updated = OrderRepository::new(self.pool)
            .set_tracking_link(order_id, link)
            .await?;
        Ok(updated)
    }

    /// Delivery marked complete: `in_delivery → completed`. Repeating the
    /// event on the now-terminal order is rejected.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` from any other
    /// status.
    #[instrument(skip(self))]
    pub async fn complete(&self, order_id: OrderId) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        let next = Self::next_status(&order, OrderEvent::DeliveryCompleted)?;
        let updated = OrderRepository::new(self.pool)
            .update_status(order_id, next)
            .await?;
        Ok(updated)
    }

    /// Cancel the order. Legal from every non-terminal status.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` once terminal.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, AppError> {
        let order = self.load(order_id).await?;
        let next = Self::next_status(&order, OrderEvent::Cancelled)?;
        let updated = OrderRepository::new(self.pool)
            .update_status(order_id, next)
            .await?;
        Ok(updated)
    }
}
