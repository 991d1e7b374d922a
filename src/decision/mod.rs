//! The authoritative ACCEPT/REJECT decision.
//!
//! The engine turns an untrusted candidate set into exactly one
//! [`DecisionRecord`]. The record validator re-checks a serialized record
//! before anything is allowed to execute on its behalf.

mod engine;
mod record;
mod run_id;
mod validate;


pub use engine::{ACCEPTED_ENVELOPE, decide, decide_bytes, decide_opaque, matches_envelope};
pub use record::{
    ARTIFACT_VERSION, AcceptPayload, Construction, DecisionRecord, MAX_NOTE_LENGTH, MAX_NOTES,
    MAX_REF_LENGTH, NOTE_ENVELOPE_MISMATCH, RULESET_ID, ReasonCode, RejectPayload,
    TransitionRecord, Verdict, canonical_json,
};
pub use run_id::{MAX_RUN_ID_LENGTH, RunId};
pub use validate::{is_absolute_ref, validate_record};
