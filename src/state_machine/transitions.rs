//! The pure transition function.

use super::events::{CANCELLATION_ALLOWED_FROM, EventToken};
use super::states::OrderState;
use std::fmt;

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Token is outside the closed event set.
    InvalidEventToken,
    /// Token is known but has no edge from the current state.
    IllegalTransition,
    /// Current state is outside the closed state set.
    InvalidCurrentState,
}

impl TransitionError {
    /// Reason code as it appears in decision records.
    pub fn code(self) -> &'static str {
        match self {
            TransitionError::InvalidEventToken => "INVALID_EVENT_TOKEN",
            TransitionError::IllegalTransition => "ILLEGAL_TRANSITION",
            TransitionError::InvalidCurrentState => "INVALID_CURRENT_STATE",
        }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Apply `event` to `current`.
///
/// Total over the typed domain: every pair either yields the next state or
/// `IllegalTransition`.
pub fn transition(current: OrderState, event: EventToken) -> Result<OrderState, TransitionError> {
    if event == EventToken::CancelOrder {
        return if CANCELLATION_ALLOWED_FROM.contains(&current) {
            Ok(OrderState::Cancelled)
        } else {
            Err(TransitionError::IllegalTransition)
        };
    }

    match event.edge() {
        Some((from, to)) if from == current => Ok(to),
        Some(_) => Err(TransitionError::IllegalTransition),
        None => Err(TransitionError::InvalidEventToken),
    }
}

/// Apply a raw event token to a raw state name.
///
/// The state guard runs before the event guard, so an unknown state reports
/// `InvalidCurrentState` even when the token is also unknown.
pub fn transition_raw(current: &str, event: &str) -> Result<OrderState, TransitionError> {
    let current: OrderState = current
        .parse()
        .map_err(|_| TransitionError::InvalidCurrentState)?;
    let event: EventToken = event
        .parse()
        .map_err(|_| TransitionError::InvalidEventToken)?;
    transition(current, event)
}

/// The full allowed-edge set, in event declaration order.
pub fn allowed_edges() -> Vec<(OrderState, OrderState)> {
    let mut edges: Vec<_> = EventToken::ALL
        .into_iter()
        .filter_map(EventToken::edge)
        .collect();
    edges.extend(
        CANCELLATION_ALLOWED_FROM
            .into_iter()
            .map(|from| (from, OrderState::Cancelled)),
    );
    edges
}

/// Whether `(from, to)` is in the allowed-edge set.
pub fn is_allowed_edge(from: OrderState, to: OrderState) -> bool {
    allowed_edges().contains(&(from, to))
}

/// Every event token that is legal from `state`.
pub fn allowed_events_from(state: OrderState) -> Vec<EventToken> {
    EventToken::ALL
        .into_iter()
        .filter(|&event| transition(state, event).is_ok())
        .collect()
}
