//! Structural validation of serialized decision records.
//!
//! The gateway never trusts a record just because the engine produced it:
//! it re-parses the serialized form here. A record passes only if every
//! required field is present, no unknown field appears at any level, the
//! decision carries exactly its own payload, and every bound holds.

use super::record::{
    ARTIFACT_VERSION, AcceptPayload, Construction, DecisionRecord, MAX_NOTE_LENGTH, MAX_NOTES,
    MAX_REF_LENGTH, RULESET_ID, ReasonCode, RejectPayload, TransitionRecord, Verdict,
};
use super::run_id::{RunId, run_id_error};
use crate::candidate::{
    Intent, MAX_CANDIDATES, MAX_ERROR_LENGTH, MAX_VALIDATOR_ERRORS, Mode, RouteCandidate, Target,
    bound, closed_enum, reject_unexpected,
};
use crate::state_machine::{DEMO_ORDER_ID, EventToken, OrderState, transition};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static NOTE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_:]+$").expect("Invalid note regex"));

static WINDOWS_DRIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("Invalid drive path regex"));

const REQUIRED_ROOT_FIELDS: [&str; 6] = [
    "artifact_version",
    "run_id",
    "input_ref",
    "proposal_set_ref",
    "decision",
    "construction",
];

const TRANSITION_FIELDS: [&str; 5] = [
    "order_id",
    "previous_state",
    "event",
    "current_state",
    "terminal",
];

/// Validate a serialized decision record.
///
/// Returns the typed record, or at most 16 bounded error codes.
pub fn validate_record(data: &Value) -> Result<DecisionRecord, Vec<String>> {
    let Some(root) = data.as_object() else {
        return Err(vec!["ROOT_NOT_OBJECT".to_string()]);
    };

    let mut errors = Vec::new();

    for field in REQUIRED_ROOT_FIELDS {
        if !root.contains_key(field) {
            errors.push(format!("MISSING_REQUIRED_FIELD:{}", field));
        }
    }
    if !errors.is_empty() {
        return Err(bound(errors));
    }

    let decision = root["decision"].as_str();
    let mut allowed = REQUIRED_ROOT_FIELDS.to_vec();
    match decision {
        Some("ACCEPT") => allowed.push("accept_payload"),
        Some("REJECT") => allowed.push("reject_payload"),
        _ => {}
    }
    reject_unexpected(root, &allowed, "UNEXPECTED_ROOT_FIELDS", &mut errors);

    if root["artifact_version"].as_str() != Some(ARTIFACT_VERSION) {
        errors.push(format!("INVALID_ARTIFACT_VERSION:expected={}", ARTIFACT_VERSION));
    }

    let run_id = match &root["run_id"] {
        Value::String(id) => match run_id_error(id) {
            Some(code) => {
                errors.push(code);
                None
            }
            None => RunId::new(id.as_str()).ok(),
        },
        _ => {
            errors.push("RUN_ID_NOT_STRING".to_string());
            None
        }
    };

    let input_ref = validate_ref(&root["input_ref"], "INPUT_REF", &mut errors);
    let candidate_set_ref = validate_ref(&root["proposal_set_ref"], "PROPOSAL_SET_REF", &mut errors);

    let verdict = match &root["decision"] {
        Value::String(d) if d == "ACCEPT" => {
            if root.contains_key("reject_payload") {
                errors.push("ACCEPT_HAS_REJECT_PAYLOAD".to_string());
            }
            match root.get("accept_payload") {
                Some(payload) => validate_accept_payload(payload, &mut errors)
                    .map(|accept_payload| Verdict::Accept { accept_payload }),
                None => {
                    errors.push("ACCEPT_MISSING_ACCEPT_PAYLOAD".to_string());
                    None
                }
            }
        }
        Value::String(d) if d == "REJECT" => {
            if root.contains_key("accept_payload") {
                errors.push("REJECT_HAS_ACCEPT_PAYLOAD".to_string());
            }
            match root.get("reject_payload") {
                Some(payload) => validate_reject_payload(payload, &mut errors)
                    .map(|reject_payload| Verdict::Reject { reject_payload }),
                None => {
                    errors.push("REJECT_MISSING_REJECT_PAYLOAD".to_string());
                    None
                }
            }
        }
        Value::String(d) => {
            errors.push(format!("INVALID_DECISION:{}", d));
            None
        }
        _ => {
            errors.push("DECISION_NOT_STRING".to_string());
            None
        }
    };

    let construction = match root["construction"].as_object() {
        Some(obj) => validate_construction(obj, &mut errors),
        None => {
            errors.push("CONSTRUCTION_NOT_OBJECT".to_string());
            None
        }
    };

    match (run_id, input_ref, candidate_set_ref, verdict, construction) {
        (Some(run_id), Some(input_ref), Some(set_ref), Some(verdict), Some(construction))
            if errors.is_empty() =>
        {
            Ok(DecisionRecord::new(
                run_id,
                input_ref,
                set_ref,
                verdict,
                construction,
            ))
        }
        _ => Err(bound(errors)),
    }
}

/// Whether `path` is absolute in Unix, Windows drive, or UNC form.
pub fn is_absolute_ref(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("\\\\") || WINDOWS_DRIVE_REGEX.is_match(path)
}

fn validate_ref(value: &Value, name: &str, errors: &mut Vec<String>) -> Option<String> {
    match value {
        Value::String(r) if r.chars().count() > MAX_REF_LENGTH => {
            errors.push(format!("{}_TOO_LONG:max={}", name, MAX_REF_LENGTH));
            None
        }
        Value::String(r) if is_absolute_ref(r) => {
            errors.push(format!("{}_ABSOLUTE_PATH", name));
            None
        }
        Value::String(r) => Some(r.clone()),
        _ => {
            errors.push(format!("{}_NOT_STRING", name));
            None
        }
    }
}

fn validate_accept_payload(payload: &Value, errors: &mut Vec<String>) -> Option<AcceptPayload> {
    let Some(payload) = payload.as_object() else {
        errors.push("ACCEPT_PAYLOAD_NOT_OBJECT".to_string());
        return None;
    };

    let Some(kind) = payload.get("kind") else {
        errors.push("ACCEPT_PAYLOAD_MISSING_KIND".to_string());
        return None;
    };

    match kind {
        Value::String(k) if k == "ROUTE" => {
            reject_unexpected(
                payload,
                &["kind", "route"],
                "ACCEPT_PAYLOAD_UNEXPECTED_FIELDS",
                errors,
            );
            let Some(route) = payload.get("route") else {
                errors.push("ACCEPT_PAYLOAD_MISSING_ROUTE".to_string());
                return None;
            };
            validate_route(route, errors).map(|route| AcceptPayload::Route { route })
        }
        Value::String(k) if k == "STATE_TRANSITION" => {
            reject_unexpected(
                payload,
                &["kind", "transition"],
                "ACCEPT_PAYLOAD_UNEXPECTED_FIELDS",
                errors,
            );
            let Some(record) = payload.get("transition") else {
                errors.push("ACCEPT_PAYLOAD_MISSING_TRANSITION".to_string());
                return None;
            };
            validate_transition(record, errors)
                .map(|transition| AcceptPayload::StateTransition { transition })
        }
        Value::String(k) => {
            errors.push(format!("ACCEPT_PAYLOAD_INVALID_KIND:{}", k));
            None
        }
        _ => {
            errors.push("ACCEPT_PAYLOAD_KIND_NOT_STRING".to_string());
            None
        }
    }
}

fn validate_route(route: &Value, errors: &mut Vec<String>) -> Option<RouteCandidate> {
    let Some(route) = route.as_object() else {
        errors.push("ROUTE_NOT_OBJECT".to_string());
        return None;
    };

    let mut missing = false;
    for field in ["intent", "target"] {
        if !route.contains_key(field) {
            errors.push(format!("ROUTE_MISSING_{}", field.to_uppercase()));
            missing = true;
        }
    }
    if missing {
        return None;
    }

    reject_unexpected(
        route,
        &["intent", "target", "mode"],
        "ROUTE_UNEXPECTED_FIELDS",
        errors,
    );

    let intent = closed_enum::<Intent>(&route["intent"], "ROUTE", "INTENT", errors);
    let target = closed_enum::<Target>(&route["target"], "ROUTE", "TARGET", errors);
    let mode = match route.get("mode") {
        Some(value) => Some(closed_enum::<Mode>(value, "ROUTE", "MODE", errors)?),
        None => None,
    };

    Some(RouteCandidate {
        intent: intent?,
        target: target?,
        mode,
    })
}

fn validate_transition(record: &Value, errors: &mut Vec<String>) -> Option<TransitionRecord> {
    let Some(record) = record.as_object() else {
        errors.push("TRANSITION_NOT_OBJECT".to_string());
        return None;
    };

    let mut missing = false;
    for field in TRANSITION_FIELDS {
        if !record.contains_key(field) {
            errors.push(format!("TRANSITION_MISSING_{}", field.to_uppercase()));
            missing = true;
        }
    }
    if missing {
        return None;
    }

    reject_unexpected(
        record,
        &TRANSITION_FIELDS,
        "TRANSITION_UNEXPECTED_FIELDS",
        errors,
    );

    let order_id = match &record["order_id"] {
        Value::String(id) if id == DEMO_ORDER_ID => Some(id.clone()),
        Value::String(id) => {
            errors.push(format!("TRANSITION_INVALID_ORDER_ID:{}", id));
            None
        }
        _ => {
            errors.push("TRANSITION_ORDER_ID_NOT_STRING".to_string());
            None
        }
    };
    let previous =
        closed_enum::<OrderState>(&record["previous_state"], "TRANSITION", "PREVIOUS_STATE", errors);
    let event = closed_enum::<EventToken>(&record["event"], "TRANSITION", "EVENT", errors);
    let current =
        closed_enum::<OrderState>(&record["current_state"], "TRANSITION", "CURRENT_STATE", errors);
    let terminal = match record["terminal"].as_bool() {
        Some(terminal) => Some(terminal),
        None => {
            errors.push("TRANSITION_TERMINAL_NOT_BOOL".to_string());
            None
        }
    };

    let (order_id, previous, event, current, terminal) =
        (order_id?, previous?, event?, current?, terminal?);

    // Each decision starts from the initial state and applies one legal edge.
    let mut consistent = true;
    if previous != OrderState::INITIAL {
        errors.push(format!("TRANSITION_PREVIOUS_STATE_NOT_INITIAL:{}", previous));
        consistent = false;
    }
    if transition(previous, event) != Ok(current) {
        errors.push("TRANSITION_ILLEGAL_EDGE".to_string());
        consistent = false;
    }
    if terminal != current.is_terminal() {
        errors.push("TRANSITION_TERMINAL_MISMATCH".to_string());
        consistent = false;
    }

    consistent.then_some(TransitionRecord {
        order_id,
        previous_state: previous,
        event,
        current_state: current,
        terminal,
    })
}

fn validate_reject_payload(payload: &Value, errors: &mut Vec<String>) -> Option<RejectPayload> {
    let Some(payload) = payload.as_object() else {
        errors.push("REJECT_PAYLOAD_NOT_OBJECT".to_string());
        return None;
    };

    let Some(reason_code) = payload.get("reason_code") else {
        errors.push("REJECT_PAYLOAD_MISSING_REASON_CODE".to_string());
        return None;
    };

    reject_unexpected(
        payload,
        &["reason_code", "notes"],
        "REJECT_PAYLOAD_UNEXPECTED_FIELDS",
        errors,
    );

    let reason_code =
        closed_enum::<ReasonCode>(reason_code, "REJECT_PAYLOAD", "REASON_CODE", errors);

    let notes = match payload.get("notes") {
        None => Some(Vec::new()),
        Some(Value::Array(items)) => {
            let errors_before = errors.len();
            if items.len() > MAX_NOTES {
                errors.push(format!("TOO_MANY_NOTES:max={}", MAX_NOTES));
            }
            let mut notes = Vec::new();
            for (i, note) in items.iter().enumerate() {
                match note {
                    Value::String(n) if n.chars().count() > MAX_NOTE_LENGTH => {
                        errors.push(format!("NOTE_{}_TOO_LONG:max={}", i, MAX_NOTE_LENGTH));
                    }
                    Value::String(n) if !NOTE_REGEX.is_match(n) => {
                        errors.push(format!("NOTE_{}_INVALID_PATTERN", i));
                    }
                    Value::String(n) => notes.push(n.clone()),
                    _ => errors.push(format!("NOTE_{}_NOT_STRING", i)),
                }
            }
            (errors.len() == errors_before).then_some(notes)
        }
        Some(_) => {
            errors.push("NOTES_NOT_ARRAY".to_string());
            None
        }
    };

    Some(RejectPayload {
        reason_code: reason_code?,
        notes: notes?,
    })
}

fn validate_construction(
    construction: &Map<String, Value>,
    errors: &mut Vec<String>,
) -> Option<Construction> {
    let mut missing = false;
    for field in ["ruleset_id", "proposal_count"] {
        if !construction.contains_key(field) {
            errors.push(format!("CONSTRUCTION_MISSING_{}", field.to_uppercase()));
            missing = true;
        }
    }
    if missing {
        return None;
    }

    reject_unexpected(
        construction,
        &[
            "ruleset_id",
            "selected_proposal_index",
            "proposal_count",
            "validator_errors",
        ],
        "CONSTRUCTION_UNEXPECTED_FIELDS",
        errors,
    );

    let errors_before = errors.len();

    match &construction["ruleset_id"] {
        Value::String(id) if id == RULESET_ID => {}
        Value::String(_) => {
            errors.push(format!("CONSTRUCTION_INVALID_RULESET_ID:expected={}", RULESET_ID));
        }
        _ => errors.push("CONSTRUCTION_RULESET_ID_NOT_STRING".to_string()),
    }

    let selected = match construction.get("selected_proposal_index") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_i64() {
            Some(index) if (0..MAX_CANDIDATES as i64).contains(&index) => Some(index as usize),
            Some(index) => {
                errors.push(format!("SELECTED_PROPOSAL_INDEX_OUT_OF_RANGE:{}", index));
                None
            }
            None => {
                errors.push("SELECTED_PROPOSAL_INDEX_NOT_INT".to_string());
                None
            }
        },
    };

    let count = match construction["proposal_count"].as_i64() {
        Some(count) if (0..=MAX_CANDIDATES as i64).contains(&count) => count as usize,
        Some(count) => {
            errors.push(format!("PROPOSAL_COUNT_OUT_OF_RANGE:{}", count));
            0
        }
        None => {
            errors.push("PROPOSAL_COUNT_NOT_INT".to_string());
            0
        }
    };

    let mut validator_errors = Vec::new();
    match construction.get("validator_errors") {
        None => {}
        Some(Value::Array(items)) => {
            if items.len() > MAX_VALIDATOR_ERRORS {
                errors.push(format!(
                    "TOO_MANY_VALIDATOR_ERRORS:max={}",
                    MAX_VALIDATOR_ERRORS
                ));
            }
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(e) if e.chars().count() > MAX_ERROR_LENGTH => {
                        errors.push(format!(
                            "VALIDATOR_ERROR_{}_TOO_LONG:max={}",
                            i, MAX_ERROR_LENGTH
                        ));
                    }
                    Value::String(e) => validator_errors.push(e.clone()),
                    _ => errors.push(format!("VALIDATOR_ERROR_{}_NOT_STRING", i)),
                }
            }
        }
        Some(_) => errors.push("VALIDATOR_ERRORS_NOT_ARRAY".to_string()),
    }

    (errors.len() == errors_before).then(|| Construction::new(selected, count, validator_errors))
}
