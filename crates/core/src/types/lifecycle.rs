//! Order lifecycle transition table.
//!
//! The status field in storage is a plain column; this module is the one
//! place that knows which moves are legal. Services must run every status
//! change through [`apply`] before persisting it.

use thiserror::Error;

use super::status::OrderStatus;

/// External events that advance an order through its lifecycle.
///
/// Webhook ingestion creates an order directly at [`OrderStatus::New`] and
/// is not an event; everything after that is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEvent {
    /// Customer opened the order in chat and confirmed its contents.
    DetailsSubmitted,
    /// Customer confirmed their phone number.
    PhoneConfirmed,
    /// Operator issued a payment link.
    PaymentLinkIssued,
    /// Operator confirmed the payment arrived.
    PaymentConfirmed,
    /// Operator issued a delivery tracking link.
    TrackingLinkIssued,
    /// Delivery marked complete.
    DeliveryCompleted,
    /// Operator or customer cancelled the order.
    Cancelled,
}

/// A transition not allowed by the lifecycle table.
///
/// Raised for any move out of a terminal status and for skipped steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} to an order in status {from}")]
pub struct InvalidTransition {
    /// Status the order was in.
    pub from: OrderStatus,
    /// Event that was rejected.
    pub event: OrderEvent,
}

/// Pure transition function over the lifecycle table.
///
/// ```text
/// new → awaiting_confirmation → waiting_operator → awaiting_payment
///     → paid → in_delivery → completed
/// ```
///
/// `Cancelled` is accepted from every non-terminal status. No step may be
/// skipped, and nothing leaves `completed` or `cancelled`.
///
/// # Errors
///
/// Returns [`InvalidTransition`] when the event is not legal for the
/// current status.
pub fn apply(from: OrderStatus, event: OrderEvent) -> Result<OrderStatus, InvalidTransition> {
    use OrderEvent as E;
    use OrderStatus as S;

    let next = match (from, event) {
        (S::New, E::DetailsSubmitted) => S::AwaitingConfirmation,
        (S::AwaitingConfirmation, E::PhoneConfirmed) => S::WaitingOperator,
        (S::WaitingOperator, E::PaymentLinkIssued) => S::AwaitingPayment,
        (S::AwaitingPayment, E::PaymentConfirmed) => S::Paid,
        (S::Paid, E::TrackingLinkIssued) => S::InDelivery,
        (S::InDelivery, E::DeliveryCompleted) => S::Completed,
        (status, E::Cancelled) if !status.is_terminal() => S::Cancelled,
        _ => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderEvent as E;
    use OrderStatus as S;

    const NON_TERMINAL: [S; 6] = [
        S::New,
        S::AwaitingConfirmation,
        S::WaitingOperator,
        S::AwaitingPayment,
        S::Paid,
        S::InDelivery,
    ];

    #[test]
    fn happy_path_walks_every_status() {
        let mut status = S::New;
        let path = [
            (E::DetailsSubmitted, S::AwaitingConfirmation),
            (E::PhoneConfirmed, S::WaitingOperator),
            (E::PaymentLinkIssued, S::AwaitingPayment),
            (E::PaymentConfirmed, S::Paid),
            (E::TrackingLinkIssued, S::InDelivery),
            (E::DeliveryCompleted, S::Completed),
        ];
        for (event, expected) in path {
            status = apply(status, event).expect("legal transition");
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn cancellation_allowed_from_every_non_terminal_status() {
        for status in NON_TERMINAL {
            assert_eq!(apply(status, E::Cancelled), Ok(S::Cancelled));
        }
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        let events = [
            E::DetailsSubmitted,
            E::PhoneConfirmed,
            E::PaymentLinkIssued,
            E::PaymentConfirmed,
            E::TrackingLinkIssued,
            E::DeliveryCompleted,
            E::Cancelled,
        ];
        for from in [S::Completed, S::Cancelled] {
            for event in events {
                assert_eq!(
                    apply(from, event),
                    Err(InvalidTransition { from, event }),
                    "{from} must not accept {event:?}"
                );
            }
        }
    }

    #[test]
    fn completing_twice_is_rejected() {
        let completed = apply(S::InDelivery, E::DeliveryCompleted).expect("first completion");
        assert_eq!(completed, S::Completed);
        assert_eq!(
            apply(completed, E::DeliveryCompleted),
            Err(InvalidTransition {
                from: S::Completed,
                event: E::DeliveryCompleted,
            })
        );
    }

    #[test]
    fn steps_cannot_be_skipped() {
        assert!(apply(S::New, E::PaymentLinkIssued).is_err());
        assert!(apply(S::AwaitingConfirmation, E::PaymentConfirmed).is_err());
        assert!(apply(S::WaitingOperator, E::TrackingLinkIssued).is_err());
        assert!(apply(S::AwaitingPayment, E::DeliveryCompleted).is_err());
    }

    #[test]
    fn error_carries_context() {
        let err = apply(S::Completed, E::Cancelled).expect_err("terminal");
        assert_eq!(err.from, S::Completed);
        assert_eq!(err.event, E::Cancelled);
        assert!(err.to_string().contains("completed"));
    }
}
