//! Run manifest.
//!
//! `manifest.json` documents what one pipeline run produced: the input and
//! its hash, every artifact with its hash, stage statuses and whether the
//! backend was executed. It is observational only and never read back by
//! the decision path.
//!
//! The execution-truth file lives in a run directory whose name the backend
//! chooses, so it is recorded by hash alone. Paths are repo-relative and no
//! timestamps are recorded, which keeps the manifest byte-identical across
//! identical runs.

use crate::decision::{RunId, canonical_json, is_absolute_ref};
use crate::error::{GateError, Result};
use crate::fs::atomic_write_file;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File name of the manifest inside the observability directory.
pub const MANIFEST_FILE: &str = "manifest.json";

pub const MANIFEST_SCHEMA_VERSION: &str = "manifest_v1";

/// Kinds of artifact a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ArtifactKind {
    #[serde(rename = "decision_record")]
    DecisionRecord,
    #[serde(rename = "decision_record.sha256")]
    DecisionDigest,
    #[serde(rename = "proposal_set")]
    CandidateSet,
    #[serde(rename = "stdout.raw.kv")]
    ExecutionTruth,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::DecisionRecord => "decision_record",
            ArtifactKind::DecisionDigest => "decision_record.sha256",
            ArtifactKind::CandidateSet => "proposal_set",
            ArtifactKind::ExecutionTruth => "stdout.raw.kv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Proposal,
    Decision,
    Execution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Ok,
    Skip,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ArtifactEntry {
    #[serde(rename = "type")]
    kind: ArtifactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    sha256: String,
    #[serde(skip)]
    authoritative: bool,
}

#[derive(Debug, Clone, Serialize)]
struct StageEntry {
    name: Stage,
    status: StageStatus,
}

#[derive(Debug, Serialize)]
struct Inputs<'a> {
    input_ref: &'a str,
    input_sha256: &'a str,
}

#[derive(Debug, Serialize)]
struct AuthorityBoundary {
    authoritative_outputs: Vec<String>,
    derived_outputs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Execution {
    executed: bool,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    schema_version: &'static str,
    run_id: &'a RunId,
    inputs: Inputs<'a>,
    artifacts: Vec<&'a ArtifactEntry>,
    stages: &'a [StageEntry],
    authority_boundary: AuthorityBoundary,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<Execution>,
}

/// Collects the facts of one run and renders `manifest.json`.
#[derive(Debug)]
pub struct ManifestBuilder {
    run_id: RunId,
    input_ref: String,
    input_sha256: String,
    artifacts: Vec<ArtifactEntry>,
    stages: Vec<StageEntry>,
    executed: Option<bool>,
}

impl ManifestBuilder {
    pub fn new(run_id: RunId, input_ref: impl Into<String>, input_sha256: impl Into<String>) -> Self {
        Self {
            run_id,
            input_ref: input_ref.into(),
            input_sha256: input_sha256.into(),
            artifacts: Vec::new(),
            stages: Vec::new(),
            executed: None,
        }
    }

    /// Record a derived artifact at a repo-relative path.
    pub fn add_artifact(&mut self, kind: ArtifactKind, path: impl Into<String>, sha256: impl Into<String>) {
        self.artifacts.push(ArtifactEntry {
            kind,
            path: Some(path.into()),
            sha256: sha256.into(),
            authoritative: false,
        });
    }

    /// Record the authoritative execution-truth file, by hash only.
    pub fn add_execution_truth(&mut self, sha256: impl Into<String>) {
        self.artifacts.push(ArtifactEntry {
            kind: ArtifactKind::ExecutionTruth,
            path: None,
            sha256: sha256.into(),
            authoritative: true,
        });
    }

    /// Stages keep insertion order.
    pub fn add_stage(&mut self, name: Stage, status: StageStatus) {
        self.stages.push(StageEntry { name, status });
    }

    pub fn record_execution(&mut self, executed: bool) {
        self.executed = Some(executed);
    }

    /// Hash of the recorded execution truth, for the run locator.
    pub fn execution_truth_sha256(&self) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::ExecutionTruth)
            .map(|a| a.sha256.as_str())
    }

    /// Render canonical JSON. Fails if any recorded path is absolute.
    pub fn render(&self) -> Result<String> {
        let mut artifacts: Vec<&ArtifactEntry> = self.artifacts.iter().collect();
        artifacts.sort_by(|a, b| (a.kind, &a.path).cmp(&(b.kind, &b.path)));

        let mut authoritative_outputs = Vec::new();
        let mut derived_outputs = Vec::new();
        for artifact in &artifacts {
            let label = artifact
                .path
                .clone()
                .unwrap_or_else(|| artifact.kind.as_str().to_string());
            if artifact.authoritative {
                authoritative_outputs.push(label);
            } else {
                derived_outputs.push(label);
            }
        }
        authoritative_outputs.sort();
        derived_outputs.sort();

        let absolute: Vec<&str> = std::iter::once(self.input_ref.as_str())
            .chain(artifacts.iter().filter_map(|a| a.path.as_deref()))
            .filter(|p| is_absolute_ref(p))
            .collect();
        if !absolute.is_empty() {
            return Err(GateError::UserError(format!(
                "manifest would contain absolute paths: {}",
                absolute.join(", ")
            )));
        }

        let manifest = Manifest {
            schema_version: MANIFEST_SCHEMA_VERSION,
            run_id: &self.run_id,
            inputs: Inputs {
                input_ref: &self.input_ref,
                input_sha256: &self.input_sha256,
            },
            artifacts,
            stages: &self.stages,
            authority_boundary: AuthorityBoundary {
                authoritative_outputs,
                derived_outputs,
            },
            execution: self.executed.map(|executed| Execution { executed }),
        };

        let value = serde_json::to_value(&manifest).map_err(|e| {
            GateError::UserError(format!("failed to serialize manifest: {}", e))
        })?;
        canonical_json(&value)
    }

    /// Write `manifest.json` into `output_dir`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(MANIFEST_FILE);
        atomic_write_file(&path, &self.render()?)?;
        Ok(path)
    }
}
