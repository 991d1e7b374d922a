//! Frozen event tokens.

use super::states::OrderState;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of event tokens.
///
/// Each token maps to exactly one `(from, to)` edge, except `cancel_order`
/// which is accepted from every state in [`CANCELLATION_ALLOWED_FROM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventToken {
    CreatePayment,
    PaymentSucceeded,
    PaymentFailed,
    RetryPayment,
    FlagFraud,
    ApproveFraud,
    RejectFraud,
    ReserveInventory,
    StartPicking,
    PackOrder,
    ShipOrder,
    MarkInTransit,
    ConfirmDelivery,
    CancelOrder,
}

/// States from which `cancel_order` is legal. All lead to `CANCELLED`.
pub const CANCELLATION_ALLOWED_FROM: [OrderState; 4] = [
    OrderState::Created,
    OrderState::PaymentPending,
    OrderState::Paid,
    OrderState::InventoryReserved,
];

impl EventToken {
    /// Every token, in declaration order.
    pub const ALL: [EventToken; 14] = [
        EventToken::CreatePayment,
        EventToken::PaymentSucceeded,
        EventToken::PaymentFailed,
        EventToken::RetryPayment,
        EventToken::FlagFraud,
        EventToken::ApproveFraud,
        EventToken::RejectFraud,
        EventToken::ReserveInventory,
        EventToken::StartPicking,
        EventToken::PackOrder,
        EventToken::ShipOrder,
        EventToken::MarkInTransit,
        EventToken::ConfirmDelivery,
        EventToken::CancelOrder,
    ];

    /// Wire name of the token.
    pub fn as_str(self) -> &'static str {
        match self {
            EventToken::CreatePayment => "create_payment",
            EventToken::PaymentSucceeded => "payment_succeeded",
            EventToken::PaymentFailed => "payment_failed",
            EventToken::RetryPayment => "retry_payment",
            EventToken::FlagFraud => "flag_fraud",
            EventToken::ApproveFraud => "approve_fraud",
            EventToken::RejectFraud => "reject_fraud",
            EventToken::ReserveInventory => "reserve_inventory",
            EventToken::StartPicking => "start_picking",
            EventToken::PackOrder => "pack_order",
            EventToken::ShipOrder => "ship_order",
            EventToken::MarkInTransit => "mark_in_transit",
            EventToken::ConfirmDelivery => "confirm_delivery",
            EventToken::CancelOrder => "cancel_order",
        }
    }

    /// The single edge this token drives, or `None` for `cancel_order`.
    pub fn edge(self) -> Option<(OrderState, OrderState)> {
        use OrderState as S;
        let edge = match self {
            EventToken::CreatePayment => (S::Created, S::PaymentPending),
            EventToken::PaymentSucceeded => (S::PaymentPending, S::Paid),
            EventToken::PaymentFailed => (S::PaymentPending, S::PaymentFailed),
            EventToken::RetryPayment => (S::PaymentFailed, S::PaymentPending),
            EventToken::FlagFraud => (S::Paid, S::FraudReview),
            EventToken::ApproveFraud => (S::FraudReview, S::InventoryReserved),
            EventToken::RejectFraud => (S::FraudReview, S::Cancelled),
            EventToken::ReserveInventory => (S::Paid, S::InventoryReserved),
            EventToken::StartPicking => (S::InventoryReserved, S::Picking),
            EventToken::PackOrder => (S::Picking, S::Packed),
            EventToken::ShipOrder => (S::Packed, S::Shipped),
            EventToken::MarkInTransit => (S::Shipped, S::InTransit),
            EventToken::ConfirmDelivery => (S::InTransit, S::Delivered),
            EventToken::CancelOrder => return None,
        };
        Some(edge)
    }
}

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventToken::ALL
            .into_iter()
            .find(|token| token.as_str() == s)
            .ok_or(())
    }
}
