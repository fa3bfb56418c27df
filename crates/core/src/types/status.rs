//! Status and role enums persisted as `PostgreSQL` enum types.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Statuses advance in a fixed sequence driven by
/// [`lifecycle::apply`](super::lifecycle::apply); `Completed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Just created from a webhook, not yet seen by the customer in chat.
    New,
    /// Customer opened the order in chat and must confirm the details.
    AwaitingConfirmation,
    /// Phone confirmed; the operator has to price delivery and send a
    /// payment link.
    WaitingOperator,
    /// Payment link issued, waiting for the customer to pay.
    AwaitingPayment,
    /// Payment confirmed by the operator.
    Paid,
    /// Tracking link issued, courier on the way.
    InDelivery,
    /// Delivered.
    Completed,
    /// Cancelled by either side.
    Cancelled,
}

impl OrderStatus {
    /// Whether no further lifecycle events are accepted from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::WaitingOperator => "waiting_operator",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::InDelivery => "in_delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "awaiting_confirmation" => Ok(Self::AwaitingConfirmation),
            "waiting_operator" => Ok(Self::WaitingOperator),
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "paid" => Ok(Self::Paid),
            "in_delivery" => Ok(Self::InDelivery),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Role of a chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A customer ordering through the site.
    Client,
    /// The single delivery manager handling orders.
    Operator,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Operator => write!(f, "operator"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "operator" => Ok(Self::Operator),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Direction of a relayed operator↔client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "message_direction", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    /// From the operator to the customer.
    ToClient,
    /// From the customer to the operator.
    ToOperator,
}
