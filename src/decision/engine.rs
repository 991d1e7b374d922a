//! The decision rules.
//!
//! First match wins:
//!
//! 1. structurally invalid set -> REJECT `INVALID_PROPOSALS`
//! 2. zero candidates -> REJECT `NO_PROPOSALS`
//! 3. one state-transition candidate -> state machine from the initial state
//! 4. one route candidate -> ACCEPT only on exact envelope equality
//! 5. two or more candidates -> REJECT `AMBIGUOUS_PROPOSALS`
//!
//! Every function here is pure: no clock, no environment, no randomness, no
//! I/O. Persisting the record is the caller's job.

use super::record::{
    AcceptPayload, Construction, DecisionRecord, NOTE_ENVELOPE_MISMATCH, ReasonCode,
    RejectPayload, TransitionRecord, Verdict,
};
use super::run_id::RunId;
use crate::candidate::{
    Candidate, CandidateSet, Intent, RouteCandidate, Target, claimed_candidate_count,
    validate_candidate_set,
};
use crate::source::OpaqueBytes;
use crate::state_machine::{DEMO_ORDER_ID, EventToken, OrderState, TransitionError, transition};
use serde_json::Value;
use tracing::debug;

/// The only route a single candidate may be accepted for.
pub const ACCEPTED_ENVELOPE: RouteCandidate = RouteCandidate {
    intent: Intent::StatusQuery,
    target: Target::Alpha,
    mode: None,
};

/// Whether `candidate` carries exactly the accepted envelope's field set.
///
/// Subsets and supersets both fail: a matching intent and target with an
/// added `mode` is a mismatch.
pub fn matches_envelope(candidate: &RouteCandidate) -> bool {
    candidate.fields() == ACCEPTED_ENVELOPE.fields()
}

/// Decide a decoded candidate set.
pub fn decide(
    data: &Value,
    run_id: &RunId,
    input_ref: &str,
    candidate_set_ref: &str,
) -> DecisionRecord {
    let (verdict, construction) = match validate_candidate_set(data) {
        Ok(set) => decide_valid(&set),
        Err(errors) => (
            reject(ReasonCode::InvalidProposals, Vec::new()),
            Construction::new(None, claimed_candidate_count(data), errors),
        ),
    };

    DecisionRecord::new(
        run_id.clone(),
        input_ref.to_string(),
        candidate_set_ref.to_string(),
        verdict,
        construction,
    )
}

/// Decide raw candidate bytes.
///
/// Bytes that are not UTF-8 JSON, including empty bytes, are treated as an
/// empty candidate set.
pub fn decide_bytes(
    bytes: &[u8],
    run_id: &RunId,
    input_ref: &str,
    candidate_set_ref: &str,
) -> DecisionRecord {
    let data = match serde_json::from_slice::<Value>(bytes) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "candidate bytes did not decode; treating as empty set");
            CandidateSet::empty("").to_value()
        }
    };
    decide(&data, run_id, input_ref, candidate_set_ref)
}

/// Decide the opaque output of a candidate source. Never fails.
pub fn decide_opaque(
    bytes: OpaqueBytes,
    run_id: &RunId,
    input_ref: &str,
    candidate_set_ref: &str,
) -> DecisionRecord {
    decide_bytes(&bytes.into_inner(), run_id, input_ref, candidate_set_ref)
}

fn decide_valid(set: &CandidateSet) -> (Verdict, Construction) {
    match set.candidates.as_slice() {
        [] => (
            reject(ReasonCode::NoProposals, Vec::new()),
            Construction::new(None, 0, Vec::new()),
        ),
        [Candidate::StateTransition { event_token }] => decide_transition(event_token),
        [Candidate::Route(route)] => {
            if matches_envelope(route) {
                (
                    Verdict::Accept {
                        accept_payload: AcceptPayload::Route { route: *route },
                    },
                    Construction::new(Some(0), 1, Vec::new()),
                )
            } else {
                (
                    reject(
                        ReasonCode::InvalidProposals,
                        vec![NOTE_ENVELOPE_MISMATCH.to_string()],
                    ),
                    Construction::new(None, 1, Vec::new()),
                )
            }
        }
        many => (
            reject(
                ReasonCode::AmbiguousProposals,
                vec![format!("PROPOSAL_COUNT:{}", many.len())],
            ),
            Construction::new(None, many.len(), Vec::new()),
        ),
    }
}

fn decide_transition(event_token: &str) -> (Verdict, Construction) {
    let current = OrderState::INITIAL;
    let outcome = event_token
        .parse::<EventToken>()
        .map_err(|_| TransitionError::InvalidEventToken)
        .and_then(|event| transition(current, event).map(|next| (event, next)));

    match outcome {
        Ok((event, next)) => (
            Verdict::Accept {
                accept_payload: AcceptPayload::StateTransition {
                    transition: TransitionRecord {
                        order_id: DEMO_ORDER_ID.to_string(),
                        previous_state: current,
                        event,
                        current_state: next,
                        terminal: next.is_terminal(),
                    },
                },
            },
            Construction::new(Some(0), 1, Vec::new()),
        ),
        Err(err) => {
            let notes = match err {
                TransitionError::IllegalTransition => vec![format!("FROM_STATE:{}", current)],
                _ => Vec::new(),
            };
            (reject(err.into(), notes), Construction::new(None, 1, Vec::new()))
        }
    }
}

fn reject(reason_code: ReasonCode, notes: Vec<String>) -> Verdict {
    Verdict::Reject {
        reject_payload: RejectPayload { reason_code, notes },
    }
}
