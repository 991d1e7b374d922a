//! Candidate set types and schema constants.

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Schema version every candidate set must declare.
pub const SCHEMA_VERSION: &str = "m1.0";

/// Maximum length of `input.raw`, in characters.
pub const MAX_INPUT_LENGTH: usize = 4096;

/// Maximum number of candidates in one set.
pub const MAX_CANDIDATES: usize = 8;

/// Maximum number of validator error codes carried forward.
pub const MAX_VALIDATOR_ERRORS: usize = 16;

/// Maximum length of a single error entry or validator code.
pub const MAX_ERROR_LENGTH: usize = 256;

/// Wire `kind` of a route candidate.
pub const KIND_ROUTE: &str = "ROUTE_CANDIDATE";

/// Wire `kind` of a state-transition candidate.
pub const KIND_STATE_TRANSITION: &str = "STATE_TRANSITION_REQUEST";

/// Requested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    RestartSubsystem,
    StopSubsystem,
    StatusQuery,
}

impl Intent {
    pub const ALL: [Intent; 3] = [
        Intent::RestartSubsystem,
        Intent::StopSubsystem,
        Intent::StatusQuery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::RestartSubsystem => "RESTART_SUBSYSTEM",
            Intent::StopSubsystem => "STOP_SUBSYSTEM",
            Intent::StatusQuery => "STATUS_QUERY",
        }
    }
}

/// Subsystem the action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Alpha,
    Beta,
    Gamma,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Alpha, Target::Beta, Target::Gamma];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Alpha => "alpha",
            Target::Beta => "beta",
            Target::Gamma => "gamma",
        }
    }
}

/// How the action should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Graceful,
    Immediate,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Graceful, Mode::Immediate];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Graceful => "graceful",
            Mode::Immediate => "immediate",
        }
    }
}

impl FromStr for Intent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for Target {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested routing of the raw input to a backend action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteCandidate {
    pub intent: Intent,
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl RouteCandidate {
    /// The candidate's populated fields as a name -> value map.
    ///
    /// Absent optional fields do not appear, so two maps are equal only when
    /// both carry exactly the same field set with the same values.
    pub fn fields(&self) -> BTreeMap<&'static str, &'static str> {
        let mut fields = BTreeMap::new();
        fields.insert("intent", self.intent.as_str());
        fields.insert("target", self.target.as_str());
        if let Some(mode) = self.mode {
            fields.insert("mode", mode.as_str());
        }
        fields
    }
}

/// One non-authoritative interpretation of the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Route(RouteCandidate),
    /// The event token is schema-checked as a string only; closed-set
    /// membership belongs to the state machine.
    StateTransition { event_token: String },
}

impl Candidate {
    /// Wire `kind` of this candidate.
    pub fn kind(&self) -> &'static str {
        match self {
            Candidate::Route(_) => KIND_ROUTE,
            Candidate::StateTransition { .. } => KIND_STATE_TRANSITION,
        }
    }

    /// Wire form of this candidate.
    pub fn to_value(&self) -> Value {
        match self {
            Candidate::Route(route) => {
                let mut slots = serde_json::Map::new();
                slots.insert("target".to_string(), json!(route.target.as_str()));
                if let Some(mode) = route.mode {
                    slots.insert("mode".to_string(), json!(mode.as_str()));
                }
                json!({
                    "kind": KIND_ROUTE,
                    "payload": {
                        "intent": route.intent.as_str(),
                        "slots": slots,
                    }
                })
            }
            Candidate::StateTransition { event_token } => json!({
                "kind": KIND_STATE_TRANSITION,
                "payload": { "event_token": event_token }
            }),
        }
    }
}

/// A structurally valid candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    pub raw_input: String,
    pub candidates: Vec<Candidate>,
    /// Producer-side error entries (informational only).
    pub errors: Vec<String>,
}

impl CandidateSet {
    /// A set with no candidates.
    pub fn empty(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            candidates: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Wire form of this set.
    pub fn to_value(&self) -> Value {
        let mut root = serde_json::Map::new();
        root.insert("schema_version".to_string(), json!(SCHEMA_VERSION));
        root.insert("input".to_string(), json!({ "raw": self.raw_input }));
        root.insert(
            "proposals".to_string(),
            Value::Array(self.candidates.iter().map(Candidate::to_value).collect()),
        );
        if !self.errors.is_empty() {
            root.insert("errors".to_string(), json!(self.errors));
        }
        Value::Object(root)
    }
}
