//! Deterministic run trace.
//!
//! A trace is the ordered list of stage events of one pipeline run, written
//! as `trace.jsonl` (one JSON object per line, keys sorted). Events carry a
//! monotonic sequence number and no timestamps or absolute paths, so two
//! identical runs produce byte-identical traces.
//!
//! # Event Format
//!
//! - `seq`: sequence number starting at 0
//! - `event`: event token (e.g. `GATE_ACCEPT`)
//! - `stage`: stage the event belongs to
//! - `detail`: optional object with event-specific details
//!
//! # Usage
//!
//! ```no_run
//! use gatekeep::observe::TraceWriter;
//! use std::path::Path;
//!
//! let mut trace = TraceWriter::new();
//! trace.run_start("inputs/request.txt", "ab12");
//! trace.write(Path::new("artifacts/observability/run_1"))?;
//! # Ok::<(), gatekeep::error::GateError>(())
//! ```

use crate::error::{GateError, Result};
use crate::fs::atomic_write_file;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the trace inside the observability directory.
pub const TRACE_FILE: &str = "trace.jsonl";

/// Event tokens recorded in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceEvent {
    RunStart,
    ProposalGenerated,
    ProposalEmpty,
    DecisionWritten,
    GateAccept,
    GateReject,
    ExecutionStarted,
    ExecutionSkipped,
    ExecutionComplete,
    LocatorResult,
    RunComplete,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            TraceEvent::RunStart => "RUN_START",
            TraceEvent::ProposalGenerated => "PROPOSAL_GENERATED",
            TraceEvent::ProposalEmpty => "PROPOSAL_EMPTY",
            TraceEvent::DecisionWritten => "DECISION_WRITTEN",
            TraceEvent::GateAccept => "GATE_ACCEPT",
            TraceEvent::GateReject => "GATE_REJECT",
            TraceEvent::ExecutionStarted => "EXECUTION_STARTED",
            TraceEvent::ExecutionSkipped => "EXECUTION_SKIPPED",
            TraceEvent::ExecutionComplete => "EXECUTION_COMPLETE",
            TraceEvent::LocatorResult => "LOCATOR_RESULT",
            TraceEvent::RunComplete => "RUN_COMPLETE",
        };
        f.write_str(token)
    }
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceStage {
    Init,
    Proposal,
    Decision,
    Gate,
    Execution,
    Locator,
    Complete,
}

/// One trace line.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub seq: u64,
    pub event: TraceEvent,
    pub stage: TraceStage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl TraceRecord {
    /// Serialize to a single line of JSON with sorted keys.
    pub fn to_jsonl_line(&self) -> Result<String> {
        let value = serde_json::to_value(self).map_err(|e| {
            GateError::UserError(format!("failed to serialize trace event to JSON: {}", e))
        })?;
        serde_json::to_string(&value).map_err(|e| {
            GateError::UserError(format!("failed to serialize trace event to JSON: {}", e))
        })
    }
}

/// Accumulates trace events in memory and writes them in one go.
#[derive(Debug, Default)]
pub struct TraceWriter {
    records: Vec<TraceRecord>,
}

impl TraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, event: TraceEvent, stage: TraceStage, detail: Option<Value>) {
        let seq = self.records.len() as u64;
        self.records.push(TraceRecord {
            seq,
            event,
            stage,
            detail,
        });
    }

    pub fn run_start(&mut self, input_ref: &str, input_sha256: &str) {
        self.emit(
            TraceEvent::RunStart,
            TraceStage::Init,
            Some(json!({"input_ref": input_ref, "input_sha256": input_sha256})),
        );
    }

    /// Record the persisted candidate set. Zero candidates is `PROPOSAL_EMPTY`.
    pub fn proposals(&mut self, set_ref: &str, count: usize, sha256: &str) {
        let event = if count == 0 {
            TraceEvent::ProposalEmpty
        } else {
            TraceEvent::ProposalGenerated
        };
        self.emit(
            event,
            TraceStage::Proposal,
            Some(json!({"path_rel": set_ref, "proposal_count": count, "sha256": sha256})),
        );
    }

    pub fn decision_written(&mut self, decision_ref: &str, decision: &str, sha256: &str) {
        self.emit(
            TraceEvent::DecisionWritten,
            TraceStage::Decision,
            Some(json!({"path_rel": decision_ref, "decision": decision, "sha256": sha256})),
        );
    }

    pub fn gate_accept(&mut self) {
        self.emit(
            TraceEvent::GateAccept,
            TraceStage::Gate,
            Some(json!({"decision": "ACCEPT"})),
        );
    }

    pub fn gate_reject(&mut self, reason_code: &str) {
        self.emit(
            TraceEvent::GateReject,
            TraceStage::Gate,
            Some(json!({"decision": "REJECT", "reason_code": reason_code})),
        );
    }

    pub fn execution_started(&mut self) {
        self.emit(TraceEvent::ExecutionStarted, TraceStage::Execution, None);
    }

    pub fn execution_skipped(&mut self, reason: &str) {
        self.emit(
            TraceEvent::ExecutionSkipped,
            TraceStage::Execution,
            Some(json!({"executed": false, "reason": reason})),
        );
    }

    /// Record a finished execution. The run directory is never recorded,
    /// only the hash of its execution truth.
    pub fn execution_complete(
        &mut self,
        executed: bool,
        exit_code: Option<i32>,
        truth_sha256: Option<&str>,
    ) {
        let mut detail = Map::new();
        detail.insert("executed".to_string(), json!(executed));
        detail.insert("exit_code".to_string(), json!(exit_code));
        if let Some(sha) = truth_sha256 {
            detail.insert("stdout_raw_kv_sha256".to_string(), json!(sha));
        }
        self.emit(
            TraceEvent::ExecutionComplete,
            TraceStage::Execution,
            Some(Value::Object(detail)),
        );
    }

    pub fn locator_result(&mut self, outcome: &str, via: Option<&str>) {
        let mut detail = Map::new();
        detail.insert("outcome".to_string(), json!(outcome));
        if let Some(via) = via {
            detail.insert("via".to_string(), json!(via));
        }
        self.emit(
            TraceEvent::LocatorResult,
            TraceStage::Locator,
            Some(Value::Object(detail)),
        );
    }

    pub fn run_complete(&mut self, run_id: &str) {
        self.emit(
            TraceEvent::RunComplete,
            TraceStage::Complete,
            Some(json!({"run_id": run_id})),
        );
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Render all events as JSON lines.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_jsonl_line()?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write `trace.jsonl` into `output_dir`, replacing any previous trace.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(TRACE_FILE);
        atomic_write_file(&path, &self.render()?)?;
        Ok(path)
    }
}
