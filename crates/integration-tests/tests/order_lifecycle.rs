//! Integration tests for the order lifecycle transition table.

use tilda_bridge_core::{InvalidTransition, OrderEvent, OrderStatus, apply};

const EVENTS: [OrderEvent; 7] = [
    OrderEvent::DetailsSubmitted,
    OrderEvent::PhoneConfirmed,
    OrderEvent::PaymentLinkIssued,
    OrderEvent::PaymentConfirmed,
    OrderEvent::TrackingLinkIssued,
    OrderEvent::DeliveryCompleted,
    OrderEvent::Cancelled,
];

#[test]
fn test_full_happy_path() {
    let mut status = OrderStatus::New;
    for (event, expected) in [
        (OrderEvent::DetailsSubmitted, OrderStatus::AwaitingConfirmation),
        (OrderEvent::PhoneConfirmed, OrderStatus::WaitingOperator),
        (OrderEvent::PaymentLinkIssued, OrderStatus::AwaitingPayment),
        (OrderEvent::PaymentConfirmed, OrderStatus::Paid),
        (OrderEvent::TrackingLinkIssued, OrderStatus::InDelivery),
        (OrderEvent::DeliveryCompleted, OrderStatus::Completed),
    ] {
        status = apply(status, event).expect("legal step");
        assert_eq!(status, expected);
    }
    assert!(status.is_terminal());
}

#[test]
fn test_exactly_one_event_is_legal_per_intermediate_status() {
    // Each non-terminal status accepts its own advancing event plus
    // cancellation, and nothing else.
    let expectations = [
        (OrderStatus::New, OrderEvent::DetailsSubmitted),
        (OrderStatus::AwaitingConfirmation, OrderEvent::PhoneConfirmed),
        (OrderStatus::WaitingOperator, OrderEvent::PaymentLinkIssued),
        (OrderStatus::AwaitingPayment, OrderEvent::PaymentConfirmed),
        (OrderStatus::Paid, OrderEvent::TrackingLinkIssued),
        (OrderStatus::InDelivery, OrderEvent::DeliveryCompleted),
    ];

    for (status, advancing) in expectations {
        for event in EVENTS {
            let result = apply(status, event);
            if event == advancing || event == OrderEvent::Cancelled {
                assert!(result.is_ok(), "{status} must accept {event:?}");
            } else {
                assert!(result.is_err(), "{status} must reject {event:?}");
            }
        }
    }
}

#[test]
fn test_completion_is_terminal() {
    let completed =
        apply(OrderStatus::InDelivery, OrderEvent::DeliveryCompleted).expect("first completion");
    assert_eq!(completed, OrderStatus::Completed);

    // Re-delivering the completion event must be rejected, not silently
    // accepted.
    let err =
        apply(completed, OrderEvent::DeliveryCompleted).expect_err("already terminal");
    assert_eq!(
        err,
        InvalidTransition {
            from: OrderStatus::Completed,
            event: OrderEvent::DeliveryCompleted,
        }
    );
}

#[test]
fn test_cancellation_is_terminal() {
    let cancelled = apply(OrderStatus::AwaitingPayment, OrderEvent::Cancelled).expect("cancel");
    for event in EVENTS {
        assert!(apply(cancelled, event).is_err());
    }
}

#[test]
fn test_cancel_reachable_from_every_non_terminal_status() {
    for status in [
        OrderStatus::New,
        OrderStatus::AwaitingConfirmation,
        OrderStatus::WaitingOperator,
        OrderStatus::AwaitingPayment,
        OrderStatus::Paid,
        OrderStatus::InDelivery,
    ] {
        assert_eq!(
            apply(status, OrderEvent::Cancelled),
            Ok(OrderStatus::Cancelled)
        );
    }
}

#[test]
fn test_error_reports_status_and_event() {
    let err = apply(OrderStatus::New, OrderEvent::PaymentConfirmed).expect_err("skip");
    assert_eq!(err.from, OrderStatus::New);
    assert_eq!(err.event, OrderEvent::PaymentConfirmed);
    let rendered = err.to_string();
    assert!(rendered.contains("new"));
    assert!(rendered.contains("PaymentConfirmed"));
}
