//! Decision record types and canonical serialization.

use super::run_id::RunId;
use crate::candidate::RouteCandidate;
use crate::error::{GateError, Result};
use crate::state_machine::{EventToken, OrderState, TransitionError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Record format version.
pub const ARTIFACT_VERSION: &str = "artifact_v1";

/// Identifier of the decision rules applied by the engine.
pub const RULESET_ID: &str = "GATE_RULESET_V1";

/// Maximum length of `input_ref` and `proposal_set_ref`.
pub const MAX_REF_LENGTH: usize = 512;

/// Maximum number of reject notes.
pub const MAX_NOTES: usize = 8;

/// Maximum length of a single reject note.
pub const MAX_NOTE_LENGTH: usize = 128;

/// Note attached when a single route candidate misses the accepted envelope.
pub const NOTE_ENVELOPE_MISMATCH: &str = "ENVELOPE_MISMATCH";

/// Why a decision was REJECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    NoProposals,
    AmbiguousProposals,
    InvalidProposals,
    InvalidEventToken,
    IllegalTransition,
    InvalidCurrentState,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 6] = [
        ReasonCode::NoProposals,
        ReasonCode::AmbiguousProposals,
        ReasonCode::InvalidProposals,
        ReasonCode::InvalidEventToken,
        ReasonCode::IllegalTransition,
        ReasonCode::InvalidCurrentState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::NoProposals => "NO_PROPOSALS",
            ReasonCode::AmbiguousProposals => "AMBIGUOUS_PROPOSALS",
            ReasonCode::InvalidProposals => "INVALID_PROPOSALS",
            ReasonCode::InvalidEventToken => "INVALID_EVENT_TOKEN",
            ReasonCode::IllegalTransition => "ILLEGAL_TRANSITION",
            ReasonCode::InvalidCurrentState => "INVALID_CURRENT_STATE",
        }
    }
}

impl From<TransitionError> for ReasonCode {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidEventToken => ReasonCode::InvalidEventToken,
            TransitionError::IllegalTransition => ReasonCode::IllegalTransition,
            TransitionError::InvalidCurrentState => ReasonCode::InvalidCurrentState,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ReasonCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}

/// A legal transition of the tracked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub order_id: String,
    pub previous_state: OrderState,
    pub event: EventToken,
    pub current_state: OrderState,
    pub terminal: bool,
}

impl TransitionRecord {
    /// The execution-truth form: newline-terminated `key=value` lines in
    /// fixed field order.
    pub fn to_kv(&self) -> String {
        format!(
            "order_id={}\nprevious_state={}\nevent={}\ncurrent_state={}\nterminal={}\n",
            self.order_id, self.previous_state, self.event, self.current_state, self.terminal
        )
    }
}

/// What an ACCEPT authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum AcceptPayload {
    #[serde(rename = "ROUTE")]
    Route { route: RouteCandidate },
    #[serde(rename = "STATE_TRANSITION")]
    StateTransition { transition: TransitionRecord },
}

/// Why nothing may execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectPayload {
    pub reason_code: ReasonCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// The decision together with its single matching payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision")]
pub enum Verdict {
    #[serde(rename = "ACCEPT")]
    Accept { accept_payload: AcceptPayload },
    #[serde(rename = "REJECT")]
    Reject { reject_payload: RejectPayload },
}

impl Verdict {
    /// `ACCEPT` or `REJECT`.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accept { .. } => "ACCEPT",
            Verdict::Reject { .. } => "REJECT",
        }
    }
}

/// How the decision was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Construction {
    pub ruleset_id: &'static str,
    pub selected_proposal_index: Option<usize>,
    pub proposal_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validator_errors: Vec<String>,
}

impl Construction {
    pub(crate) fn new(selected: Option<usize>, count: usize, validator_errors: Vec<String>) -> Self {
        Self {
            ruleset_id: RULESET_ID,
            selected_proposal_index: selected,
            proposal_count: count,
            validator_errors,
        }
    }
}

/// The authoritative, immutable ACCEPT/REJECT record for one run.
///
/// Fields are private: a record is either built by the decision engine or
/// parsed by the record validator, so every instance is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRecord {
    artifact_version: &'static str,
    run_id: RunId,
    input_ref: String,
    #[serde(rename = "proposal_set_ref")]
    candidate_set_ref: String,
    #[serde(flatten)]
    verdict: Verdict,
    construction: Construction,
}

impl DecisionRecord {
    pub(crate) fn new(
        run_id: RunId,
        input_ref: String,
        candidate_set_ref: String,
        verdict: Verdict,
        construction: Construction,
    ) -> Self {
        Self {
            artifact_version: ARTIFACT_VERSION,
            run_id,
            input_ref,
            candidate_set_ref,
            verdict,
            construction,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn input_ref(&self) -> &str {
        &self.input_ref
    }

    pub fn candidate_set_ref(&self) -> &str {
        &self.candidate_set_ref
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn is_accept(&self) -> bool {
        matches!(self.verdict, Verdict::Accept { .. })
    }

    pub fn accept_payload(&self) -> Option<&AcceptPayload> {
        match &self.verdict {
            Verdict::Accept { accept_payload } => Some(accept_payload),
            Verdict::Reject { .. } => None,
        }
    }

    pub fn reject_payload(&self) -> Option<&RejectPayload> {
        match &self.verdict {
            Verdict::Accept { .. } => None,
            Verdict::Reject { reject_payload } => Some(reject_payload),
        }
    }

    /// JSON tree of this record. Object keys come out sorted.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| {
            GateError::UserError(format!("failed to serialize decision record: {}", e))
        })
    }

    /// Canonical file form: sorted keys, 2-space indentation, trailing newline.
    ///
    /// Identical records always serialize to identical bytes.
    pub fn to_canonical_json(&self) -> Result<String> {
        canonical_json(&self.to_value()?)
    }
}

/// Serialize any JSON tree in the canonical file form.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)
        .map_err(|e| GateError::UserError(format!("failed to serialize JSON: {}", e)))?;
    out.push('\n');
    Ok(out)
}
