//! The execution gateway: the only path to the backend.
//!
//! The gateway takes a decision record in its serialized form and
//! re-validates it before doing anything. A record that fails validation is
//! a [`GateError::BoundaryViolation`]. A REJECT is a no-op. An ACCEPT either
//! invokes the backend exactly once (route) or writes synthesized execution
//! truth (state transition).
//!
//! # Call states
//!
//! ```text
//! NOT_STARTED -> REJECTED_NO_OP | EXECUTED | FAILED_TO_INVOKE
//! ```
//!
//! Every returned [`ExecutionResult`] is in a terminal state.

mod backend;
mod synth;


pub use backend::{Backend, BackendOutput, ProcessBackend, parse_run_directory};
pub use synth::{EXECUTION_TRUTH_FILE, EXIT_CODE_FILE, SYNTHESIZED_EXIT_CODE, write_transition_run};

use crate::decision::{AcceptPayload, DecisionRecord, RunId, TransitionRecord, validate_record};
use crate::error::{GateError, Result};
use crate::guard::GateTicket;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle of a single gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    NotStarted,
    RejectedNoOp,
    Executed,
    FailedToInvoke,
}

impl CallState {
    pub fn as_str(self) -> &'static str {
        match self {
            CallState::NotStarted => "NOT_STARTED",
            CallState::RejectedNoOp => "REJECTED_NO_OP",
            CallState::Executed => "EXECUTED",
            CallState::FailedToInvoke => "FAILED_TO_INVOKE",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, CallState::NotStarted)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub state: CallState,
    pub executed: bool,
    /// Where the execution truth was written, as reported or created.
    pub run_directory: Option<PathBuf>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl ExecutionResult {
    fn rejected() -> Self {
        Self {
            state: CallState::RejectedNoOp,
            executed: false,
            run_directory: None,
            exit_code: None,
            error: None,
        }
    }

    fn executed(run_directory: Option<PathBuf>, exit_code: Option<i32>) -> Self {
        Self {
            state: CallState::Executed,
            executed: true,
            run_directory,
            exit_code,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            state: CallState::FailedToInvoke,
            executed: false,
            run_directory: None,
            exit_code: None,
            error: Some(error),
        }
    }

    /// Path of the execution-truth file inside the reported run directory.
    pub fn execution_truth_path(&self) -> Option<PathBuf> {
        self.run_directory
            .as_ref()
            .map(|dir| dir.join(EXECUTION_TRUTH_FILE))
    }

    /// Whether the backend ran and exited zero.
    pub fn is_success(&self) -> bool {
        self.executed && self.exit_code == Some(0)
    }
}

/// Require `record` to be a structurally valid ACCEPT.
///
/// Anything else, including a valid REJECT, is a boundary violation.
pub fn require_accept(record: &Value) -> Result<DecisionRecord> {
    let record = validate_record(record).map_err(GateError::BoundaryViolation)?;
    if !record.is_accept() {
        return Err(GateError::BoundaryViolation(vec![
            "DECISION_NOT_ACCEPT".to_string(),
        ]));
    }
    Ok(record)
}

/// The single authorized path to the backend.
pub struct ExecutionGateway {
    backend: Box<dyn Backend>,
    run_root: PathBuf,
}

impl ExecutionGateway {
    pub fn new(backend: Box<dyn Backend>, run_root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            run_root: run_root.into(),
        }
    }

    /// Namespace under which run directories appear.
    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    /// Execute `record` if, and only if, it is a valid ACCEPT.
    ///
    /// Consumes the run's gate ticket. Returns `BoundaryViolation` for a
    /// record that fails structural validation or belongs to another run.
    pub fn run_if_accepted(
        &self,
        ticket: GateTicket,
        record: &Value,
        input: &Path,
    ) -> Result<ExecutionResult> {
        let record = validate_record(record).map_err(|errors| {
            warn!(errors = ?errors, "gateway refused malformed decision record");
            GateError::BoundaryViolation(errors)
        })?;

        if record.run_id() != ticket.run_id() {
            return Err(GateError::BoundaryViolation(vec![format!(
                "RUN_ID_MISMATCH:expected={}",
                ticket.run_id()
            )]));
        }

        let result = match record.accept_payload() {
            None => {
                info!(run_id = %record.run_id(), "decision is REJECT; backend not invoked");
                ExecutionResult::rejected()
            }
            Some(AcceptPayload::StateTransition { transition }) => {
                self.synthesize(record.run_id(), transition)
            }
            Some(AcceptPayload::Route { route }) => {
                debug!(intent = %route.intent, target = %route.target, "dispatching route");
                self.invoke_backend(input)
            }
        };

        debug!(state = %result.state, executed = result.executed, "gateway call finished");
        Ok(result)
    }

    fn synthesize(&self, run_id: &RunId, transition: &TransitionRecord) -> ExecutionResult {
        match write_transition_run(&self.run_root, run_id, transition) {
            Ok(run_dir) => {
                info!(
                    run_directory = %run_dir.display(),
                    event = %transition.event,
                    "wrote synthesized transition record"
                );
                ExecutionResult::executed(Some(run_dir), Some(SYNTHESIZED_EXIT_CODE))
            }
            Err(e) => ExecutionResult::failed(e.to_string()),
        }
    }

    fn invoke_backend(&self, input: &Path) -> ExecutionResult {
        if !input.is_file() {
            return ExecutionResult::failed(format!("input file not found: {}", input.display()));
        }

        info!(input = %input.display(), "invoking backend");
        match self.backend.invoke(input) {
            Ok(output) => {
                let run_directory = output.reported_run_directory().map(|reported| {
                    let reported = PathBuf::from(reported);
                    if reported.is_relative() {
                        self.backend.working_dir().join(reported)
                    } else {
                        reported
                    }
                });
                if run_directory.is_none() {
                    warn!("backend did not report a run directory");
                }
                ExecutionResult::executed(run_directory, output.exit_code)
            }
            Err(e) => {
                warn!(error = %e, "backend invocation failed");
                ExecutionResult::failed(e.to_string())
            }
        }
    }
}
