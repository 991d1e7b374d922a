//! Error types for gatekeep.
//!
//! Uses thiserror for derive macros. REJECT decisions are never errors; only
//! operational failures and boundary violations surface here.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for gatekeep operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// Operational failure: bad arguments, I/O, config, or invalid state.
    #[error("{0}")]
    UserError(String),

    /// An ACCEPT was dispatched but the backend did not complete successfully.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Execution was attempted with something that is not a valid ACCEPT.
    ///
    /// This is a programming error upstream of the gateway and must abort.
    #[error("boundary violation: decision record failed validation: {}", .0.join(", "))]
    BoundaryViolation(Vec<String>),

    /// A once-per-run capability was requested a second time.
    #[error("boundary violation: {0} may be taken exactly once per run")]
    ExactlyOnce(&'static str),

    /// A decision record file failed structural validation (`check`).
    #[error("invalid decision record: {}", .0.join(", "))]
    InvalidRecord(Vec<String>),
}

impl GateError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateError::UserError(_) => exit_codes::OPERATIONAL_FAILURE,
            GateError::ExecutionFailed(_) => exit_codes::OPERATIONAL_FAILURE,
            GateError::BoundaryViolation(_) => exit_codes::BOUNDARY_VIOLATION,
            GateError::ExactlyOnce(_) => exit_codes::BOUNDARY_VIOLATION,
            GateError::InvalidRecord(_) => exit_codes::BOUNDARY_VIOLATION,
        }
    }

    /// Whether this error signals a structural safety breach.
    pub fn is_boundary_violation(&self) -> bool {
        matches!(
            self,
            GateError::BoundaryViolation(_) | GateError::ExactlyOnce(_)
        )
    }
}

/// Result type alias for gatekeep operations.
pub type Result<T> = std::result::Result<T, GateError>;
