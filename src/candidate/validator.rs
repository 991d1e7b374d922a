//! Structural validation of candidate sets.
//!
//! Works on the decoded JSON tree rather than through serde derive so that
//! every failure maps to a bounded, enumerable error code and unknown fields
//! are rejected at every nesting level. Error codes are non-authoritative:
//! they explain a REJECT, they never decide one.

use super::model::{
    Candidate, CandidateSet, KIND_ROUTE, KIND_STATE_TRANSITION, MAX_CANDIDATES, MAX_ERROR_LENGTH,
    MAX_INPUT_LENGTH, MAX_VALIDATOR_ERRORS, Mode, RouteCandidate, SCHEMA_VERSION, Target, Intent,
};
use serde_json::{Map, Value};

/// Validate a decoded candidate set.
///
/// Returns the typed set, or at most [`MAX_VALIDATOR_ERRORS`] error codes,
/// each at most [`MAX_ERROR_LENGTH`] characters.
pub fn validate_candidate_set(data: &Value) -> Result<CandidateSet, Vec<String>> {
    let Some(root) = data.as_object() else {
        return Err(vec!["ROOT_NOT_OBJECT".to_string()]);
    };

    let mut errors = Vec::new();

    for field in ["schema_version", "input", "proposals"] {
        if !root.contains_key(field) {
            errors.push(format!("MISSING_REQUIRED_FIELD:{}", field));
        }
    }
    if !errors.is_empty() {
        return Err(bound(errors));
    }

    reject_unexpected(
        root,
        &["schema_version", "input", "proposals", "errors"],
        "UNEXPECTED_ROOT_FIELDS",
        &mut errors,
    );

    if root["schema_version"].as_str() != Some(SCHEMA_VERSION) {
        errors.push(format!("INVALID_SCHEMA_VERSION:expected={}", SCHEMA_VERSION));
    }

    let raw_input = validate_input(&root["input"], &mut errors);

    let candidates = match root["proposals"].as_array() {
        None => {
            errors.push("PROPOSALS_NOT_ARRAY".to_string());
            Vec::new()
        }
        Some(items) => {
            if items.len() > MAX_CANDIDATES {
                errors.push(format!("TOO_MANY_PROPOSALS:max={}", MAX_CANDIDATES));
            }
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| validate_candidate(item, index, &mut errors))
                .collect()
        }
    };

    let producer_errors = match root.get("errors") {
        Some(entries) => validate_error_entries(entries, &mut errors),
        None => Vec::new(),
    };

    if errors.is_empty() {
        Ok(CandidateSet {
            raw_input: raw_input.unwrap_or_default(),
            candidates,
            errors: producer_errors,
        })
    } else {
        Err(bound(errors))
    }
}

/// Number of candidates a possibly-invalid set claims to carry, capped at
/// [`MAX_CANDIDATES`].
pub fn claimed_candidate_count(data: &Value) -> usize {
    data.get("proposals")
        .and_then(Value::as_array)
        .map(|items| items.len().min(MAX_CANDIDATES))
        .unwrap_or(0)
}

fn validate_input(input: &Value, errors: &mut Vec<String>) -> Option<String> {
    let Some(input) = input.as_object() else {
        errors.push("INPUT_NOT_OBJECT".to_string());
        return None;
    };

    reject_unexpected(input, &["raw"], "UNEXPECTED_INPUT_FIELDS", errors);

    match input.get("raw") {
        None => {
            errors.push("MISSING_INPUT_RAW".to_string());
            None
        }
        Some(Value::String(raw)) if raw.chars().count() > MAX_INPUT_LENGTH => {
            errors.push(format!("INPUT_RAW_TOO_LONG:max={}", MAX_INPUT_LENGTH));
            None
        }
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(_) => {
            errors.push("INPUT_RAW_NOT_STRING".to_string());
            None
        }
    }
}

fn validate_candidate(item: &Value, index: usize, errors: &mut Vec<String>) -> Option<Candidate> {
    let prefix = format!("PROPOSAL_{}", index);
    let errors_before = errors.len();

    let Some(obj) = item.as_object() else {
        errors.push(format!("{}_NOT_OBJECT", prefix));
        return None;
    };

    if !obj.contains_key("kind") {
        errors.push(format!("{}_MISSING_KIND", prefix));
    }
    if !obj.contains_key("payload") {
        errors.push(format!("{}_MISSING_PAYLOAD", prefix));
    }
    if errors.len() > errors_before {
        return None;
    }

    reject_unexpected(
        obj,
        &["kind", "payload"],
        &format!("{}_UNEXPECTED_FIELDS", prefix),
        errors,
    );

    let payload = &obj["payload"];
    let candidate = match &obj["kind"] {
        Value::String(kind) if kind == KIND_ROUTE => validate_route_payload(payload, &prefix, errors),
        Value::String(kind) if kind == KIND_STATE_TRANSITION => {
            validate_transition_payload(payload, &prefix, errors)
        }
        Value::String(kind) => {
            errors.push(format!("{}_INVALID_KIND:{}", prefix, kind));
            None
        }
        _ => {
            errors.push(format!("{}_KIND_NOT_STRING", prefix));
            None
        }
    };

    if errors.len() > errors_before {
        None
    } else {
        candidate
    }
}

fn validate_route_payload(
    payload: &Value,
    prefix: &str,
    errors: &mut Vec<String>,
) -> Option<Candidate> {
    let Some(payload) = payload.as_object() else {
        errors.push(format!("{}_PAYLOAD_NOT_OBJECT", prefix));
        return None;
    };

    let mut missing = false;
    for field in ["intent", "slots"] {
        if !payload.contains_key(field) {
            errors.push(format!("{}_PAYLOAD_MISSING_{}", prefix, field.to_uppercase()));
            missing = true;
        }
    }
    if missing {
        return None;
    }

    reject_unexpected(
        payload,
        &["intent", "slots"],
        &format!("{}_PAYLOAD_UNEXPECTED_FIELDS", prefix),
        errors,
    );

    let intent = closed_enum::<Intent>(&payload["intent"], prefix, "INTENT", errors);

    let Some(slots) = payload["slots"].as_object() else {
        errors.push(format!("{}_SLOTS_NOT_OBJECT", prefix));
        return None;
    };

    reject_unexpected(
        slots,
        &["target", "mode"],
        &format!("{}_SLOTS_UNEXPECTED_FIELDS", prefix),
        errors,
    );

    let target = match slots.get("target") {
        Some(value) => closed_enum::<Target>(value, prefix, "TARGET", errors),
        None => {
            errors.push(format!("{}_SLOTS_MISSING_TARGET", prefix));
            None
        }
    };

    let mode = match slots.get("mode") {
        Some(value) => Some(closed_enum::<Mode>(value, prefix, "MODE", errors)?),
        None => None,
    };

    Some(Candidate::Route(RouteCandidate {
        intent: intent?,
        target: target?,
        mode,
    }))
}

fn validate_transition_payload(
    payload: &Value,
    prefix: &str,
    errors: &mut Vec<String>,
) -> Option<Candidate> {
    let Some(payload) = payload.as_object() else {
        errors.push(format!("{}_PAYLOAD_NOT_OBJECT", prefix));
        return None;
    };

    let Some(token) = payload.get("event_token") else {
        errors.push(format!("{}_PAYLOAD_MISSING_EVENT_TOKEN", prefix));
        return None;
    };

    reject_unexpected(
        payload,
        &["event_token"],
        &format!("{}_PAYLOAD_UNEXPECTED_FIELDS", prefix),
        errors,
    );

    match token {
        Value::String(token) => Some(Candidate::StateTransition {
            event_token: token.clone(),
        }),
        _ => {
            errors.push(format!("{}_EVENT_TOKEN_NOT_STRING", prefix));
            None
        }
    }
}

fn validate_error_entries(entries: &Value, errors: &mut Vec<String>) -> Vec<String> {
    let Some(entries) = entries.as_array() else {
        errors.push("ERRORS_NOT_ARRAY".to_string());
        return Vec::new();
    };

    if entries.len() > MAX_VALIDATOR_ERRORS {
        errors.push(format!("TOO_MANY_ERROR_ENTRIES:max={}", MAX_VALIDATOR_ERRORS));
    }

    let mut accepted = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match entry {
            Value::String(s) if s.chars().count() > MAX_ERROR_LENGTH => {
                errors.push(format!("ERROR_ENTRY_{}_TOO_LONG:max={}", i, MAX_ERROR_LENGTH));
            }
            Value::String(s) => accepted.push(s.clone()),
            _ => errors.push(format!("ERROR_ENTRY_{}_NOT_STRING", i)),
        }
    }
    accepted
}

/// Parse a closed-enum string field, recording `<prefix>_<FIELD>_NOT_STRING`
/// or `<prefix>_INVALID_<FIELD>:<value>` on failure.
pub(crate) fn closed_enum<T: std::str::FromStr>(
    value: &Value,
    prefix: &str,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    match value {
        Value::String(s) => match s.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(format!("{}_INVALID_{}:{}", prefix, field, s));
                None
            }
        },
        _ => {
            errors.push(format!("{}_{}_NOT_STRING", prefix, field));
            None
        }
    }
}

/// Record `<code>:<sorted extra keys>` when `obj` has keys outside `allowed`.
pub(crate) fn reject_unexpected(
    obj: &Map<String, Value>,
    allowed: &[&str],
    code: &str,
    errors: &mut Vec<String>,
) {
    // Map iteration is key-sorted, so the joined list is deterministic.
    let extra: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();
    if !extra.is_empty() {
        errors.push(format!("{}:{}", code, extra.join(",")));
    }
}

/// Cap the number and length of error codes.
pub(crate) fn bound(errors: Vec<String>) -> Vec<String> {
    errors
        .into_iter()
        .take(MAX_VALIDATOR_ERRORS)
        .map(|code| truncate_chars(code, MAX_ERROR_LENGTH))
        .collect()
}

pub(crate) fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_index, _)) => s[..byte_index].to_string(),
        None => s,
    }
}
