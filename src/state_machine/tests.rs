//! Tests for the closed state machine.

use super::*;

#[test]
fn test_initial_and_terminal_states() {
    assert_eq!(OrderState::INITIAL, OrderState::Created);

    let terminal: Vec<_> = OrderState::ALL
        .into_iter()
        .filter(|s| s.is_terminal())
        .collect();
    assert_eq!(terminal, vec![OrderState::Delivered, OrderState::Cancelled]);
}

#[test]
fn test_closed_sets_have_expected_sizes() {
    assert_eq!(OrderState::ALL.len(), 12);
    assert_eq!(EventToken::ALL.len(), 14);
    assert_eq!(allowed_edges().len(), 17);
}

#[test]
fn test_happy_path_to_delivery() {
    let path = [
        EventToken::CreatePayment,
        EventToken::PaymentSucceeded,
        EventToken::ReserveInventory,
        EventToken::StartPicking,
        EventToken::PackOrder,
        EventToken::ShipOrder,
        EventToken::MarkInTransit,
        EventToken::ConfirmDelivery,
    ];

    let mut state = OrderState::INITIAL;
    for event in path {
        state = transition(state, event).unwrap();
    }
    assert_eq!(state, OrderState::Delivered);
}

#[test]
fn test_payment_retry_loop() {
    let state = transition(OrderState::PaymentPending, EventToken::PaymentFailed).unwrap();
    assert_eq!(state, OrderState::PaymentFailed);
    let state = transition(state, EventToken::RetryPayment).unwrap();
    assert_eq!(state, OrderState::PaymentPending);
}

#[test]
fn test_fraud_review_branches() {
    assert_eq!(
        transition(OrderState::Paid, EventToken::FlagFraud),
        Ok(OrderState::FraudReview)
    );
    assert_eq!(
        transition(OrderState::FraudReview, EventToken::ApproveFraud),
        Ok(OrderState::InventoryReserved)
    );
    assert_eq!(
        transition(OrderState::FraudReview, EventToken::RejectFraud),
        Ok(OrderState::Cancelled)
    );
}

#[test]
fn test_payment_succeeded_is_illegal_from_initial_state() {
    assert_eq!(
        transition(OrderState::INITIAL, EventToken::PaymentSucceeded),
        Err(TransitionError::IllegalTransition)
    );
}

#[test]
fn test_totality_every_pair_is_either_an_edge_or_illegal() {
    for state in OrderState::ALL {
        for event in EventToken::ALL {
            match transition(state, event) {
                Ok(next) => assert!(
                    is_allowed_edge(state, next),
                    "{} --{}--> {} is not in the allowed-edge set",
                    state,
                    event,
                    next
                ),
                Err(err) => assert_eq!(
                    err,
                    TransitionError::IllegalTransition,
                    "{} --{}--> must be ILLEGAL_TRANSITION",
                    state,
                    event
                ),
            }
        }
    }
}

#[test]
fn test_every_allowed_edge_is_reachable_by_some_event() {
    for (from, to) in allowed_edges() {
        let reachable = EventToken::ALL
            .into_iter()
            .any(|event| transition(from, event) == Ok(to));
        assert!(reachable, "edge {} -> {} has no event", from, to);
    }
}

#[test]
fn test_cancellation_edge_set() {
    for state in OrderState::ALL {
        let result = transition(state, EventToken::CancelOrder);
        if CANCELLATION_ALLOWED_FROM.contains(&state) {
            assert_eq!(result, Ok(OrderState::Cancelled), "cancel from {}", state);
        } else {
            assert_eq!(
                result,
                Err(TransitionError::IllegalTransition),
                "cancel from {}",
                state
            );
        }
    }

    assert!(transition(OrderState::Delivered, EventToken::CancelOrder).is_err());
    assert!(transition(OrderState::Cancelled, EventToken::CancelOrder).is_err());
}

#[test]
fn test_terminal_states_have_no_outgoing_events() {
    assert!(allowed_events_from(OrderState::Delivered).is_empty());
    assert!(allowed_events_from(OrderState::Cancelled).is_empty());
}

#[test]
fn test_allowed_events_from_initial_state() {
    assert_eq!(
        allowed_events_from(OrderState::Created),
        vec![EventToken::CreatePayment, EventToken::CancelOrder]
    );
}

#[test]
fn test_raw_transition_guards() {
    assert_eq!(
        transition_raw("CREATED", "create_payment"),
        Ok(OrderState::PaymentPending)
    );
    assert_eq!(
        transition_raw("CREATED", "teleport_order"),
        Err(TransitionError::InvalidEventToken)
    );
    assert_eq!(
        transition_raw("LIMBO", "create_payment"),
        Err(TransitionError::InvalidCurrentState)
    );
    // State guard wins when both are unknown.
    assert_eq!(
        transition_raw("LIMBO", "teleport_order"),
        Err(TransitionError::InvalidCurrentState)
    );
    // Tokens are case-sensitive wire names.
    assert_eq!(
        transition_raw("CREATED", "CREATE_PAYMENT"),
        Err(TransitionError::InvalidEventToken)
    );
}

#[test]
fn test_wire_names_round_trip_through_from_str() {
    for state in OrderState::ALL {
        assert_eq!(state.as_str().parse::<OrderState>(), Ok(state));
    }
    for event in EventToken::ALL {
        assert_eq!(event.as_str().parse::<EventToken>(), Ok(event));
    }
}

#[test]
fn test_error_codes() {
    assert_eq!(TransitionError::InvalidEventToken.code(), "INVALID_EVENT_TOKEN");
    assert_eq!(TransitionError::IllegalTransition.code(), "ILLEGAL_TRANSITION");
    assert_eq!(
        TransitionError::InvalidCurrentState.code(),
        "INVALID_CURRENT_STATE"
    );
}
