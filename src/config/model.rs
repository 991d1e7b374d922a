//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a gatekeep workspace.
///
/// Paths are relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Candidate source used for every run.
    pub engine: EngineKind,

    /// Backend command, split with shell-words. Invoked as
    /// `<command> --input <path>` from the workspace root.
    #[serde(default = "default_backend_command")]
    pub backend_command: String,

    /// Root of the persisted artifacts (proposals, decisions, observability).
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// Namespace in which the backend creates run directories.
    #[serde(default = "default_run_root")]
    pub run_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            backend_command: default_backend_command(),
            artifacts_dir: default_artifacts_dir(),
            run_root: default_run_root(),
        }
    }
}
