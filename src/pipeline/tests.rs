//! Tests for the end-to-end pipeline.

use super::*;
use crate::config::Config;
use crate::decision::{ReasonCode, validate_record};
use crate::locator::Discovery;
use crate::observe::{MANIFEST_FILE, TRACE_FILE};
use crate::source::{DeterministicSource, NullSource};
use crate::test_support::{ScriptedBackend, write_input};
use std::fs;
use tempfile::TempDir;

struct Fixture {
    _temp_dir: TempDir,
    ws: Workspace,
    gateway: ExecutionGateway,
}

impl Fixture {
    fn new() -> Self {
        Self::with_backend(|backend| backend)
    }

    fn with_backend(configure: impl FnOnce(ScriptedBackend) -> ScriptedBackend) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let ws = Workspace::resolve_from(temp_dir.path(), &Config::default()).unwrap();
        let backend = configure(ScriptedBackend::new(&ws.root, &ws.run_root));
        let gateway = ExecutionGateway::new(Box::new(backend), ws.run_root.clone());
        Self {
            _temp_dir: temp_dir,
            ws,
            gateway,
        }
    }

    fn run(&self, text: &str, run_id: Option<&str>) -> Result<RunReport> {
        let input = write_input(&self.ws.root, "request.txt", text);
        run_pipeline(&self.ws, &DeterministicSource, &self.gateway, &input, run_id)
    }

    fn run_dirs(&self) -> usize {
        Snapshot::capture(&self.ws.run_root).unwrap().len()
    }
}

fn reason(report: &RunReport) -> ReasonCode {
    report.record.reject_payload().unwrap().reason_code
}

#[test]
fn test_exact_envelope_accepts_and_executes() {
    let fixture = Fixture::new();

    let report = fixture.run("status of alpha", Some("r1")).unwrap();

    assert!(report.record.is_accept());
    assert!(report.execution.executed);
    assert_eq!(fixture.run_dirs(), 1);
    match &report.locator {
        LocatorOutcome::Unique { path, via, .. } => {
            assert_eq!(*via, Discovery::Delta);
            assert_eq!(Some(path.clone()), report.execution.execution_truth_path());
        }
        other => panic!("expected UNIQUE, got {:?}", other),
    }
    assert_eq!(
        report.result_line(),
        "decision=ACCEPT executed=true locator=UNIQUE"
    );
    assert!(report.failure().is_none());
}

#[test]
fn test_artifacts_are_persisted() {
    let fixture = Fixture::new();
    let report = fixture.run("status of alpha", Some("r1")).unwrap();
    let run_id = RunId::new("r1").unwrap();

    assert_eq!(report.input_ref, "inputs/request.txt");
    assert_eq!(report.candidate_set_ref, "artifacts/proposals/r1/proposal_set.json");
    assert_eq!(report.decision_ref, "artifacts/decisions/r1/decision.json");

    let candidate_set: Value =
        serde_json::from_slice(&fs::read(fixture.ws.candidate_set_path(&run_id)).unwrap()).unwrap();
    assert_eq!(candidate_set["proposals"].as_array().unwrap().len(), 1);

    let record_json = fs::read_to_string(fixture.ws.decision_path(&run_id)).unwrap();
    assert_eq!(record_json, report.record.to_canonical_json().unwrap());
    let record: Value = serde_json::from_str(&record_json).unwrap();
    assert!(validate_record(&record).is_ok());

    let digest = fs::read_to_string(fixture.ws.decision_digest_path(&run_id)).unwrap();
    assert_eq!(digest, format!("{}\n", sha256_hex(record_json.as_bytes())));

    assert!(report.observability_dir.join(MANIFEST_FILE).is_file());
    assert!(report.observability_dir.join(TRACE_FILE).is_file());
}

#[test]
fn test_envelope_mismatch_rejects_without_execution() {
    let fixture = Fixture::new();

    let report = fixture.run("status of beta", Some("r1")).unwrap();

    assert_eq!(reason(&report), ReasonCode::InvalidProposals);
    assert_eq!(
        report.record.reject_payload().unwrap().notes,
        vec!["ENVELOPE_MISMATCH".to_string()]
    );
    assert!(!report.execution.executed);
    assert_eq!(report.execution.state, CallState::RejectedNoOp);
    assert_eq!(fixture.run_dirs(), 0);
    assert_eq!(report.locator, LocatorOutcome::NotFound);
    assert_eq!(
        report.result_line(),
        "decision=REJECT reason_code=INVALID_PROPOSALS"
    );
    assert!(report.failure().is_none());
}

#[test]
fn test_illegal_transition_rejects() {
    let fixture = Fixture::new();

    let report = fixture.run("payment succeeded", Some("r1")).unwrap();

    assert_eq!(reason(&report), ReasonCode::IllegalTransition);
    assert_eq!(fixture.run_dirs(), 0);
}

#[test]
fn test_legal_transition_synthesizes_truth() {
    let fixture = Fixture::new();

    let report = fixture.run("create payment", Some("r1")).unwrap();

    assert!(report.record.is_accept());
    assert!(report.execution.executed);
    assert_eq!(
        report.execution.run_directory,
        Some(fixture.ws.run_root.join("transition_r1"))
    );
    assert!(report.locator.is_unique());
}

#[test]
fn test_unrecognized_input_is_no_proposals() {
    let fixture = Fixture::new();

    let report = fixture.run("make me a sandwich", Some("r1")).unwrap();

    assert_eq!(reason(&report), ReasonCode::NoProposals);
    assert_eq!(report.candidate_count, 0);
    assert_eq!(
        report.result_line(),
        "decision=REJECT reason_code=NO_PROPOSALS"
    );
}

#[test]
fn test_null_source_persists_canonical_empty_set() {
    let fixture = Fixture::new();
    let input = write_input(&fixture.ws.root, "request.txt", "status of alpha");

    let report = run_pipeline(&fixture.ws, &NullSource, &fixture.gateway, &input, Some("r1")).unwrap();

    assert_eq!(reason(&report), ReasonCode::NoProposals);
    let persisted =
        fs::read_to_string(fixture.ws.candidate_set_path(&RunId::new("r1").unwrap())).unwrap();
    assert_eq!(
        persisted,
        canonical_json(&CandidateSet::empty("").to_value()).unwrap()
    );
}

#[test]
fn test_run_id_is_derived_from_input() {
    let fixture = Fixture::new();

    let first = fixture.run("status of beta", None).unwrap();
    let second = fixture.run("status of beta", None).unwrap();

    assert!(first.run_id.as_str().starts_with("run_"));
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.run_id, RunId::derive(b"status of beta"));
}

#[test]
fn test_invalid_run_id_is_user_error() {
    let fixture = Fixture::new();
    let err = fixture.run("status of alpha", Some("../escape")).unwrap_err();
    assert!(matches!(err, GateError::UserError(_)));
    assert_eq!(fixture.run_dirs(), 0);
}

#[test]
fn test_missing_input_is_user_error() {
    let fixture = Fixture::new();
    let err = run_pipeline(
        &fixture.ws,
        &DeterministicSource,
        &fixture.gateway,
        &fixture.ws.root.join("missing.txt"),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to read input file"));
}

#[test]
fn test_nonzero_backend_exit_is_a_failure() {
    let fixture = Fixture::with_backend(|mut backend| {
        backend.exit_code = 3;
        backend
    });

    let report = fixture.run("status of alpha", Some("r1")).unwrap();

    assert!(report.execution.executed);
    assert_eq!(report.failure().unwrap(), "backend exited with code 3");
}

#[test]
fn test_locator_finds_unreported_run_directory() {
    let fixture = Fixture::with_backend(|mut backend| {
        backend.report_directory = false;
        backend
    });

    let report = fixture.run("status of alpha", Some("r1")).unwrap();

    assert!(report.execution.run_directory.is_none());
    match report.locator {
        LocatorOutcome::Unique { path, via, .. } => {
            assert_eq!(via, Discovery::Delta);
            assert!(path.starts_with(&fixture.ws.run_root));
        }
        other => panic!("expected UNIQUE, got {:?}", other),
    }
}

#[test]
fn test_observability_is_byte_identical_across_runs() {
    let fixture = Fixture::new();

    let first = fixture.run("status of alpha", Some("r1")).unwrap();
    let manifest = fs::read(first.observability_dir.join(MANIFEST_FILE)).unwrap();
    let trace = fs::read(first.observability_dir.join(TRACE_FILE)).unwrap();
    let record = first.record.to_canonical_json().unwrap();

    let second = fixture.run("status of alpha", Some("r1")).unwrap();

    assert_eq!(fs::read(second.observability_dir.join(MANIFEST_FILE)).unwrap(), manifest);
    assert_eq!(fs::read(second.observability_dir.join(TRACE_FILE)).unwrap(), trace);
    assert_eq!(second.record.to_canonical_json().unwrap(), record);
    assert_eq!(fixture.run_dirs(), 2);
}

#[test]
fn test_trace_records_stage_events_in_order() {
    let fixture = Fixture::new();
    let report = fixture.run("status of alpha", Some("r1")).unwrap();

    let trace = fs::read_to_string(report.observability_dir.join(TRACE_FILE)).unwrap();
    let events: Vec<String> = trace
        .lines()
        .map(|line| {
            let value: Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(
        events,
        vec![
            "RUN_START",
            "PROPOSAL_GENERATED",
            "DECISION_WRITTEN",
            "GATE_ACCEPT",
            "EXECUTION_STARTED",
            "EXECUTION_COMPLETE",
            "LOCATOR_RESULT",
            "RUN_COMPLETE",
        ]
    );
}

#[test]
fn test_manifest_records_truth_by_hash() {
    let fixture = Fixture::new();
    let report = fixture.run("status of alpha", Some("r1")).unwrap();

    let manifest: Value = serde_json::from_slice(
        &fs::read(report.observability_dir.join(MANIFEST_FILE)).unwrap(),
    )
    .unwrap();
    let truth = manifest["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["type"] == "stdout.raw.kv")
        .unwrap();

    let LocatorOutcome::Unique { sha256, .. } = &report.locator else {
        panic!("expected UNIQUE");
    };
    assert_eq!(truth["sha256"], sha256.as_str());
    assert!(truth.get("path").is_none());
    assert_eq!(manifest["execution"]["executed"], true);
}

#[test]
fn test_sections_are_ordered() {
    let fixture = Fixture::new();

    let rejected = render_sections(&fixture.run("status of beta", Some("r1")).unwrap());
    let p1 = rejected.find("[1/3] PROPOSAL").unwrap();
    let p2 = rejected.find("[2/3] DECISION").unwrap();
    let p3 = rejected.find("[3/3] EXECUTION").unwrap();
    assert!(p1 < p2 && p2 < p3);
    assert!(rejected.contains("Status: NOT INVOKED"));
    assert!(rejected.contains("Reason: INVALID_PROPOSALS"));

    let accepted = render_sections(&fixture.run("status of alpha", Some("r2")).unwrap());
    assert!(accepted.contains("Status: INVOKED"));
    assert!(accepted.contains("Locator: UNIQUE via DELTA"));
}
