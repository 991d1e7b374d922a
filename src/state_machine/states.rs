//! Frozen order states.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fixed identity of the single tracked order.
pub const DEMO_ORDER_ID: &str = "demo-order-1";

/// Closed set of order processing states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Created,
    PaymentPending,
    PaymentFailed,
    Paid,
    FraudReview,
    InventoryReserved,
    Picking,
    Packed,
    Shipped,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderState {
    /// Every state, in declaration order.
    pub const ALL: [OrderState; 12] = [
        OrderState::Created,
        OrderState::PaymentPending,
        OrderState::PaymentFailed,
        OrderState::Paid,
        OrderState::FraudReview,
        OrderState::InventoryReserved,
        OrderState::Picking,
        OrderState::Packed,
        OrderState::Shipped,
        OrderState::InTransit,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    /// The state every decision computation starts from.
    pub const INITIAL: OrderState = OrderState::Created;

    /// Wire name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::PaymentPending => "PAYMENT_PENDING",
            OrderState::PaymentFailed => "PAYMENT_FAILED",
            OrderState::Paid => "PAID",
            OrderState::FraudReview => "FRAUD_REVIEW",
            OrderState::InventoryReserved => "INVENTORY_RESERVED",
            OrderState::Picking => "PICKING",
            OrderState::Packed => "PACKED",
            OrderState::Shipped => "SHIPPED",
            OrderState::InTransit => "IN_TRANSIT",
            OrderState::Delivered => "DELIVERED",
            OrderState::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states have no outgoing edges.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or(())
    }
}
