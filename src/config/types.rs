//! Configuration types and defaults for gatekeep.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate source bound at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Closed-set pattern matcher (default).
    #[default]
    Deterministic,
    /// Never proposes anything; every run is REJECT(NO_PROPOSALS).
    None,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Deterministic => "deterministic",
            EngineKind::None => "none",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn default_backend_command() -> String {
    "./scripts/run_backend.sh".to_string()
}

pub fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}

pub fn default_run_root() -> String {
    "artifacts/run".to_string()
}
