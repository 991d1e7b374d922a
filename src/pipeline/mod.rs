//! The end-to-end run: input -> candidates -> decision -> execution -> locate.
//!
//! Each stage hands the next one bytes or a serialized record, never live
//! objects: the candidate set is persisted and decided from its bytes, and
//! the gateway receives the decision record exactly as it was written to
//! disk.
//!
//! Order of effects for one run:
//!
//! 1. read input, derive or validate the run id
//! 2. acquire candidates (seam ticket), persist `proposal_set.json`
//! 3. decide, persist `decision.json` and `decision.json.sha256`
//! 4. snapshot run root, gateway call (gate ticket), snapshot again
//! 5. hash execution truth, locate it
//! 6. write `manifest.json` and `trace.jsonl`

mod report;

#[cfg(test)]
mod tests;

pub use report::render_sections;

use crate::candidate::{CandidateSet, claimed_candidate_count};
use crate::context::Workspace;
use crate::decision::{DecisionRecord, RunId, canonical_json, decide_opaque};
use crate::error::{GateError, Result};
use crate::fs::{atomic_write, atomic_write_file, sha256_file, sha256_hex};
use crate::gateway::{CallState, ExecutionGateway, ExecutionResult};
use crate::guard::RunGuard;
use crate::locator::{LocatorOutcome, Snapshot, locate};
use crate::observe::{ArtifactKind, ManifestBuilder, Stage, StageStatus, TraceWriter};
use crate::source::{CandidateSource, OpaqueBytes, acquire_candidates};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything a caller needs to report one finished run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    pub input_ref: String,
    pub candidate_set_ref: String,
    pub candidate_count: usize,
    pub decision_ref: String,
    pub record: DecisionRecord,
    pub execution: ExecutionResult,
    pub locator: LocatorOutcome,
    pub observability_dir: PathBuf,
}

impl RunReport {
    /// The single machine-readable stdout line.
    pub fn result_line(&self) -> String {
        match self.record.reject_payload() {
            Some(reject) => format!("decision=REJECT reason_code={}", reject.reason_code),
            None => format!(
                "decision=ACCEPT executed={} locator={}",
                self.execution.executed,
                self.locator.label()
            ),
        }
    }

    /// Why an ACCEPT did not complete, if it did not.
    ///
    /// REJECT is never a failure.
    pub fn failure(&self) -> Option<String> {
        if !self.record.is_accept() {
            return None;
        }
        match self.execution.state {
            CallState::FailedToInvoke => Some(
                self.execution
                    .error
                    .clone()
                    .unwrap_or_else(|| "backend was not invoked".to_string()),
            ),
            CallState::Executed if !self.execution.is_success() => Some(match self.execution.exit_code {
                Some(code) => format!("backend exited with code {}", code),
                None => "backend was terminated by a signal".to_string(),
            }),
            _ => None,
        }
    }
}

/// Run the full pipeline for `input`.
///
/// REJECT is a successful run. Operational failures surface as
/// `UserError`; a record the gateway refuses surfaces as
/// `BoundaryViolation`.
pub fn run_pipeline(
    ws: &Workspace,
    source: &dyn CandidateSource,
    gateway: &ExecutionGateway,
    input: &Path,
    run_id: Option<&str>,
) -> Result<RunReport> {
    let input_bytes = std::fs::read(input).map_err(|e| {
        GateError::UserError(format!(
            "failed to read input file '{}': {}",
            input.display(),
            e
        ))
    })?;
    let input = input.canonicalize().map_err(|e| {
        GateError::UserError(format!(
            "failed to resolve input file '{}': {}",
            input.display(),
            e
        ))
    })?;

    let run_id = match run_id {
        Some(id) => RunId::new(id)?,
        None => RunId::derive(&input_bytes),
    };
    let input_ref = ws.ref_for(&input);
    let input_sha256 = sha256_hex(&input_bytes);
    info!(run_id = %run_id, input = %input_ref, "run started");

    let mut guard = RunGuard::new(run_id.clone());
    let mut trace = TraceWriter::new();
    let mut manifest = ManifestBuilder::new(run_id.clone(), input_ref.clone(), input_sha256.clone());
    trace.run_start(&input_ref, &input_sha256);

    // Candidates
    let seam = guard.take_seam()?;
    let mut candidate_bytes = acquire_candidates(source, seam, &input_bytes).into_inner();
    if candidate_bytes.is_empty() {
        candidate_bytes = canonical_json(&CandidateSet::empty("").to_value())?.into_bytes();
    }

    let candidate_set_path = ws.candidate_set_path(&run_id);
    atomic_write(&candidate_set_path, &candidate_bytes)?;
    let candidate_set_ref = ws.ref_for(&candidate_set_path);
    let candidate_sha256 = sha256_hex(&candidate_bytes);
    let candidate_count = serde_json::from_slice::<Value>(&candidate_bytes)
        .map(|value| claimed_candidate_count(&value))
        .unwrap_or(0);

    trace.proposals(&candidate_set_ref, candidate_count, &candidate_sha256);
    manifest.add_artifact(ArtifactKind::CandidateSet, candidate_set_ref.clone(), candidate_sha256);
    manifest.add_stage(
        Stage::Proposal,
        if candidate_count == 0 {
            StageStatus::Skip
        } else {
            StageStatus::Ok
        },
    );
    debug!(count = candidate_count, path = %candidate_set_ref, "candidate set persisted");

    // Decision
    let record = decide_opaque(
        OpaqueBytes::new(candidate_bytes),
        &run_id,
        &input_ref,
        &candidate_set_ref,
    );
    let record_json = record.to_canonical_json()?;
    let record_sha256 = sha256_hex(record_json.as_bytes());

    let decision_path = ws.decision_path(&run_id);
    let digest_path = ws.decision_digest_path(&run_id);
    atomic_write_file(&decision_path, &record_json)?;
    atomic_write_file(&digest_path, &format!("{}\n", record_sha256))?;
    let decision_ref = ws.ref_for(&decision_path);

    trace.decision_written(&decision_ref, record.verdict().label(), &record_sha256);
    manifest.add_artifact(ArtifactKind::DecisionRecord, decision_ref.clone(), record_sha256);
    manifest.add_artifact(
        ArtifactKind::DecisionDigest,
        ws.ref_for(&digest_path),
        sha256_file(&digest_path)?,
    );
    manifest.add_stage(Stage::Decision, StageStatus::Ok);
    match record.reject_payload() {
        Some(reject) => trace.gate_reject(reject.reason_code.as_str()),
        None => trace.gate_accept(),
    }
    info!(decision = record.verdict().label(), "decision persisted");

    // Execution: the gateway sees the record as written.
    let serialized: Value = serde_json::from_str(&record_json).map_err(|e| {
        GateError::UserError(format!("failed to re-read decision record: {}", e))
    })?;

    let before = Snapshot::capture(&ws.run_root)?;
    let gate = guard.take_gate()?;
    if record.is_accept() {
        trace.execution_started();
    }
    let execution = gateway.run_if_accepted(gate, &serialized, &input)?;
    let after = Snapshot::capture(&ws.run_root)?;

    let truth_sha256 = match execution.execution_truth_path() {
        Some(path) if path.is_file() => Some(sha256_file(&path)?),
        _ => None,
    };
    if let Some(sha) = &truth_sha256 {
        manifest.add_execution_truth(sha.clone());
    }
    manifest.record_execution(execution.executed);

    let execution_status = match execution.state {
        CallState::RejectedNoOp => {
            trace.execution_skipped("DECISION_REJECT");
            StageStatus::Skip
        }
        _ => {
            trace.execution_complete(
                execution.executed,
                execution.exit_code,
                truth_sha256.as_deref(),
            );
            if execution.is_success() {
                StageStatus::Ok
            } else {
                StageStatus::Fail
            }
        }
    };
    manifest.add_stage(Stage::Execution, execution_status);

    // Locate
    let locator = locate(
        &ws.run_root,
        &before,
        &after,
        manifest.execution_truth_sha256(),
    )?;
    let via = match &locator {
        LocatorOutcome::Unique { via, .. } => Some(via.as_str()),
        _ => None,
    };
    trace.locator_result(locator.label(), via);
    trace.run_complete(run_id.as_str());

    let observability_dir = ws.observability_dir(&run_id);
    manifest.write(&observability_dir)?;
    trace.write(&observability_dir)?;
    info!(run_id = %run_id, locator = locator.label(), "run complete");

    Ok(RunReport {
        run_id,
        input_ref,
        candidate_set_ref,
        candidate_count,
        decision_ref,
        record,
        execution,
        locator,
        observability_dir,
    })
}
