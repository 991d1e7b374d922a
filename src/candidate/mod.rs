//! Non-authoritative candidate interpretations and their validator.
//!
//! A candidate set is whatever the candidate source produced for one raw
//! input. Nothing in here decides anything; the validator only reports whether
//! the set is well-formed and, if not, why.

mod model;
mod validator;


pub use model::{
    Candidate, CandidateSet, Intent, KIND_ROUTE, KIND_STATE_TRANSITION, MAX_CANDIDATES,
    MAX_ERROR_LENGTH, MAX_INPUT_LENGTH, MAX_VALIDATOR_ERRORS, Mode, RouteCandidate,
    SCHEMA_VERSION, Target,
};
pub use validator::{claimed_candidate_count, validate_candidate_set};

pub(crate) use validator::{bound, closed_enum, reject_unexpected, truncate_chars};
