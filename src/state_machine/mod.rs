//! Closed order-processing state machine.
//!
//! Twelve frozen states, fourteen frozen event tokens, and a pure transition
//! function over them. The tracked order always starts at
//! [`OrderState::INITIAL`]; nothing here persists between calls.
//!
//! # Edges
//!
//! ```text
//! CREATED -> PAYMENT_PENDING -> PAID -> INVENTORY_RESERVED -> PICKING -> PACKED
//!         -> SHIPPED -> IN_TRANSIT -> DELIVERED
//! PAYMENT_PENDING <-> PAYMENT_FAILED
//! PAID -> FRAUD_REVIEW -> INVENTORY_RESERVED | CANCELLED
//! cancel_order: CREATED | PAYMENT_PENDING | PAID | INVENTORY_RESERVED -> CANCELLED
//! ```

mod events;
mod states;
mod transitions;

#[cfg(test)]
mod tests;

pub use events::{CANCELLATION_ALLOWED_FROM, EventToken};
pub use states::{DEMO_ORDER_ID, OrderState};
pub use transitions::{
    TransitionError, allowed_edges, allowed_events_from, is_allowed_edge, transition,
    transition_raw,
};
