//! Human-readable stage sections for stderr.
//!
//! Each section is labeled with its authority level so a reader cannot
//! mistake candidates for a decision or a decision for execution truth.
//! The execution-truth file is referenced, never printed.

use super::RunReport;
use crate::gateway::{CallState, EXECUTION_TRUTH_FILE};
use crate::locator::LocatorOutcome;
use std::fmt::Write;

const RULE: &str =
    "================================================================================";

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", RULE);
}

/// Render the three stage sections of a finished run.
pub fn render_sections(report: &RunReport) -> String {
    let mut out = String::new();

    header(&mut out, "[1/3] PROPOSAL (DERIVED, NON-AUTHORITATIVE)");
    let _ = writeln!(out, "  Proposal count: {}", report.candidate_count);
    let _ = writeln!(out, "  Source: {}", report.candidate_set_ref);
    let status = match report.candidate_count {
        0 => "NO PROPOSALS GENERATED".to_string(),
        1 => "SINGLE PROPOSAL".to_string(),
        n => format!("MULTIPLE PROPOSALS ({})", n),
    };
    let _ = writeln!(out, "  Status: {}", status);
    let _ = writeln!(out);

    header(&mut out, "[2/3] DECISION (AUTHORITATIVE)");
    let construction = report.record.construction();
    let _ = writeln!(out, "  Decision: {}", report.record.verdict().label());
    let _ = writeln!(out, "  Ruleset: {}", construction.ruleset_id);
    let _ = writeln!(out, "  Proposal count: {}", construction.proposal_count);
    let _ = writeln!(out, "  Record: {}", report.decision_ref);
    match report.record.reject_payload() {
        Some(reject) => {
            let _ = writeln!(out, "  Status: EXECUTION NOT PERMITTED");
            let _ = writeln!(out, "  Reason: {}", reject.reason_code);
            if !reject.notes.is_empty() {
                let _ = writeln!(out, "  Notes: {}", reject.notes.join(", "));
            }
        }
        None => {
            let _ = writeln!(out, "  Status: EXECUTION PERMITTED");
        }
    }
    let _ = writeln!(out);

    header(
        &mut out,
        &format!("[3/3] EXECUTION (AUTHORITATIVE OUTPUT = {})", EXECUTION_TRUTH_FILE),
    );
    let execution = &report.execution;
    match execution.state {
        CallState::RejectedNoOp | CallState::NotStarted => {
            let _ = writeln!(out, "  Status: NOT INVOKED");
            let _ = writeln!(out, "  Reason: decision is REJECT");
        }
        CallState::FailedToInvoke => {
            let _ = writeln!(out, "  Status: FAILED TO INVOKE");
            if let Some(error) = &execution.error {
                let _ = writeln!(out, "  Error: {}", error);
            }
        }
        CallState::Executed => {
            let _ = writeln!(out, "  Status: INVOKED");
            if let Some(dir) = &execution.run_directory {
                let _ = writeln!(out, "  Run directory: {}", dir.display());
            }
            if let Some(code) = execution.exit_code {
                let _ = writeln!(out, "  Exit code: {}", code);
            }
        }
    }
    match &report.locator {
        LocatorOutcome::Unique { path, via, .. } => {
            let _ = writeln!(out, "  Locator: UNIQUE via {} ({})", via.as_str(), path.display());
        }
        LocatorOutcome::Ambiguous { count } => {
            let _ = writeln!(out, "  Locator: AMBIGUOUS ({} candidates)", count);
        }
        LocatorOutcome::NotFound => {
            let _ = writeln!(out, "  Locator: NOT_FOUND");
        }
    }

    out
}
