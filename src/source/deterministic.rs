//! Closed-set pattern matching candidate source.
//!
//! Recognizes a fixed vocabulary of route phrases and state-transition
//! phrases. Matching is case-insensitive on the trimmed input and yields at
//! most one candidate. Anything unrecognized yields an empty set, never a
//! guess.

use super::CandidateSource;
use super::opaque::OpaqueBytes;
use crate::candidate::{
    Candidate, CandidateSet, Intent, MAX_INPUT_LENGTH, Mode, RouteCandidate, Target,
    truncate_chars,
};
use crate::error::{GateError, Result};
use crate::state_machine::EventToken;
use regex::Regex;
use std::sync::LazyLock;

/// Producer error for input over [`MAX_INPUT_LENGTH`] characters.
pub const INPUT_TOO_LONG: &str = "INPUT_TOO_LONG";

/// Producer error for input that is not UTF-8.
pub const INPUT_NOT_UTF8: &str = "INPUT_NOT_UTF8";

enum ModeSlot {
    Absent,
    Captured,
    Fixed(Mode),
}

struct RoutePattern {
    regex: Regex,
    intent: Intent,
    mode: ModeSlot,
}

fn route_pattern(pattern: &str, intent: Intent, mode: ModeSlot) -> RoutePattern {
    RoutePattern {
        regex: Regex::new(&format!("(?i){}", pattern)).expect("Invalid route pattern"),
        intent,
        mode,
    }
}

static ROUTE_PATTERNS: LazyLock<Vec<RoutePattern>> = LazyLock::new(|| {
    use Intent::*;
    vec![
        route_pattern(
            r"^restart\s+(alpha|beta|gamma)\s+subsystem\s+(gracefully|immediately)$",
            RestartSubsystem,
            ModeSlot::Captured,
        ),
        route_pattern(
            r"^graceful\s+restart\s+of\s+(alpha|beta|gamma)$",
            RestartSubsystem,
            ModeSlot::Fixed(Mode::Graceful),
        ),
        route_pattern(
            r"^immediate\s+restart\s+of\s+(alpha|beta|gamma)$",
            RestartSubsystem,
            ModeSlot::Fixed(Mode::Immediate),
        ),
        route_pattern(
            r"^stop\s+(alpha|beta|gamma)\s+subsystem\s+(gracefully|immediately)$",
            StopSubsystem,
            ModeSlot::Captured,
        ),
        route_pattern(
            r"^graceful\s+stop\s+of\s+(alpha|beta|gamma)$",
            StopSubsystem,
            ModeSlot::Fixed(Mode::Graceful),
        ),
        route_pattern(
            r"^immediate\s+stop\s+of\s+(alpha|beta|gamma)$",
            StopSubsystem,
            ModeSlot::Fixed(Mode::Immediate),
        ),
        route_pattern(r"^status\s+of\s+(alpha|beta|gamma)$", StatusQuery, ModeSlot::Absent),
        route_pattern(
            r"^query\s+status\s+of\s+(alpha|beta|gamma)$",
            StatusQuery,
            ModeSlot::Absent,
        ),
        route_pattern(r"^(alpha|beta|gamma)\s+status$", StatusQuery, ModeSlot::Absent),
    ]
});

/// One phrase per event token: its words separated by any whitespace.
static EVENT_PATTERNS: LazyLock<Vec<(Regex, EventToken)>> = LazyLock::new(|| {
    EventToken::ALL
        .into_iter()
        .map(|token| {
            let words = token.as_str().replace('_', r"\s+");
            let regex = Regex::new(&format!(r"(?i)^\s*{}\s*$", words))
                .expect("Invalid event pattern");
            (regex, token)
        })
        .collect()
});

/// Pattern matching candidate source.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicSource;

impl DeterministicSource {
    /// Build the candidate set for a raw input.
    pub fn candidate_set(&self, raw_input: &[u8]) -> CandidateSet {
        let Ok(text) = std::str::from_utf8(raw_input) else {
            let mut set = CandidateSet::empty("");
            set.errors.push(INPUT_NOT_UTF8.to_string());
            return set;
        };

        if text.chars().count() > MAX_INPUT_LENGTH {
            let mut set = CandidateSet::empty(truncate_chars(text.to_string(), MAX_INPUT_LENGTH));
            set.errors.push(INPUT_TOO_LONG.to_string());
            return set;
        }

        let mut set = CandidateSet::empty(text);
        if let Some(candidate) = match_phrase(text.trim()) {
            set.candidates.push(candidate);
        }
        set
    }
}

impl CandidateSource for DeterministicSource {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn propose(&self, raw_input: &[u8]) -> Result<OpaqueBytes> {
        let set = self.candidate_set(raw_input);
        let bytes = serde_json::to_vec(&set.to_value()).map_err(|e| {
            GateError::UserError(format!("failed to serialize candidate set: {}", e))
        })?;
        Ok(OpaqueBytes::new(bytes))
    }
}

/// Match trimmed input against the route phrases, then the event phrases.
fn match_phrase(text: &str) -> Option<Candidate> {
    if text.is_empty() {
        return None;
    }

    for pattern in ROUTE_PATTERNS.iter() {
        if let Some(route) = match_route(pattern, text) {
            return Some(Candidate::Route(route));
        }
    }

    EVENT_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, token)| Candidate::StateTransition {
            event_token: token.as_str().to_string(),
        })
}

fn match_route(pattern: &RoutePattern, text: &str) -> Option<RouteCandidate> {
    let caps = pattern.regex.captures(text)?;
    let target: Target = caps.get(1)?.as_str().to_lowercase().parse().ok()?;

    let mode = match pattern.mode {
        ModeSlot::Absent => None,
        ModeSlot::Fixed(mode) => Some(mode),
        ModeSlot::Captured => match caps.get(2)?.as_str().to_lowercase().as_str() {
            "gracefully" => Some(Mode::Graceful),
            "immediately" => Some(Mode::Immediate),
            _ => return None,
        },
    };

    Some(RouteCandidate {
        intent: pattern.intent,
        target,
        mode,
    })
}
