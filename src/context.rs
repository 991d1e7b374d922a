//! Workspace path resolution for gatekeep.
//!
//! A workspace is a directory holding `gatekeep.yaml`, the persisted
//! artifacts and the backend's run-directory namespace. All commands resolve
//! their paths through [`Workspace`] so that every artifact lands in the same
//! layout regardless of where the command is invoked from:
//!
//! ```text
//! <root>/
//!   gatekeep.yaml
//!   <artifacts_dir>/
//!     proposals/<run_id>/proposal_set.json
//!     decisions/<run_id>/decision.json
//!     decisions/<run_id>/decision.json.sha256
//!     observability/<run_id>/{manifest.json,trace.jsonl}
//!   <run_root>/...
//! ```
//!
//! Refs recorded in artifacts are root-relative with `/` separators. A file
//! outside the root is recorded as `[external]:<basename>`.

use crate::config::{CONFIG_FILE, Config};
use crate::decision::RunId;
use crate::error::{GateError, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

pub const CANDIDATE_SET_FILE: &str = "proposal_set.json";
pub const DECISION_FILE: &str = "decision.json";
pub const DECISION_DIGEST_FILE: &str = "decision.json.sha256";

/// Prefix of refs to files outside the workspace root.
pub const EXTERNAL_REF_PREFIX: &str = "[external]:";

/// Resolved paths for one gatekeep workspace. All paths are absolute.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Canonical workspace root.
    pub root: PathBuf,

    /// Root of persisted artifacts (default: `{root}/artifacts/`).
    pub artifacts_dir: PathBuf,

    /// Namespace the backend creates run directories in (default: `{root}/artifacts/run/`).
    pub run_root: PathBuf,
}

impl Workspace {
    /// Resolve a workspace at `root`, or at the current directory.
    pub fn resolve(root: Option<&Path>, config: &Config) -> Result<Self> {
        match root {
            Some(root) => Self::resolve_from(root, config),
            None => {
                let cwd = env::current_dir().map_err(|e| {
                    GateError::UserError(format!(
                        "failed to get current working directory: {}",
                        e
                    ))
                })?;
                Self::resolve_from(&cwd, config)
            }
        }
    }

    /// Resolve a workspace at a specific directory.
    pub fn resolve_from<P: AsRef<Path>>(root: P, config: &Config) -> Result<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            GateError::UserError(format!(
                "workspace root '{}' is not accessible: {}",
                root.display(),
                e
            ))
        })?;

        let artifacts_dir = root.join(&config.artifacts_dir);
        let run_root = root.join(&config.run_root);

        Ok(Self {
            root,
            artifacts_dir,
            run_root,
        })
    }

    /// Default config path for a root (before the workspace is resolved).
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    pub fn proposals_dir(&self, run_id: &RunId) -> PathBuf {
        self.artifacts_dir.join("proposals").join(run_id.as_str())
    }

    pub fn candidate_set_path(&self, run_id: &RunId) -> PathBuf {
        self.proposals_dir(run_id).join(CANDIDATE_SET_FILE)
    }

    pub fn decisions_dir(&self, run_id: &RunId) -> PathBuf {
        self.artifacts_dir.join("decisions").join(run_id.as_str())
    }

    pub fn decision_path(&self, run_id: &RunId) -> PathBuf {
        self.decisions_dir(run_id).join(DECISION_FILE)
    }

    pub fn decision_digest_path(&self, run_id: &RunId) -> PathBuf {
        self.decisions_dir(run_id).join(DECISION_DIGEST_FILE)
    }

    pub fn observability_dir(&self, run_id: &RunId) -> PathBuf {
        self.artifacts_dir.join("observability").join(run_id.as_str())
    }

    /// Root-relative ref for `path`, or `[external]:<basename>` if it lies
    /// outside the root.
    pub fn ref_for(&self, path: &Path) -> String {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let resolved = absolute.canonicalize().unwrap_or_else(|_| normalize(&absolute));

        match resolved.strip_prefix(&self.root) {
            Ok(relative) => slash_join(relative),
            Err(_) => {
                let name = resolved
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{}{}", EXTERNAL_REF_PREFIX, name)
            }
        }
    }
}

/// Lexically resolve `.` and `..` in a path that may not exist.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn slash_join(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    fn workspace(temp_dir: &TempDir) -> Workspace {
        Workspace::resolve_from(temp_dir.path(), &Config::default()).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let run_id = RunId::new("r1").unwrap();

        assert_eq!(ws.root, temp_dir.path().canonicalize().unwrap());
        assert_eq!(ws.artifacts_dir, ws.root.join("artifacts"));
        assert_eq!(ws.run_root, ws.root.join("artifacts").join("run"));
        assert_eq!(
            ws.candidate_set_path(&run_id),
            ws.root.join("artifacts/proposals/r1/proposal_set.json")
        );
        assert_eq!(
            ws.decision_path(&run_id),
            ws.root.join("artifacts/decisions/r1/decision.json")
        );
        assert_eq!(
            ws.decision_digest_path(&run_id),
            ws.root.join("artifacts/decisions/r1/decision.json.sha256")
        );
        assert_eq!(
            ws.observability_dir(&run_id),
            ws.root.join("artifacts/observability/r1")
        );
    }

    #[test]
    fn test_configured_layout() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            artifacts_dir: "out".to_string(),
            run_root: "runs".to_string(),
            ..Config::default()
        };
        let ws = Workspace::resolve_from(temp_dir.path(), &config).unwrap();

        assert_eq!(ws.artifacts_dir, ws.root.join("out"));
        assert_eq!(ws.run_root, ws.root.join("runs"));
    }

    #[test]
    fn test_missing_root_is_user_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Workspace::resolve_from(temp_dir.path().join("nope"), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("is not accessible"));
    }

    #[test]
    fn test_ref_for_paths_inside_root() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        std::fs::create_dir_all(ws.root.join("inputs")).unwrap();
        std::fs::write(ws.root.join("inputs/request.txt"), "x").unwrap();

        assert_eq!(ws.ref_for(&ws.root.join("inputs/request.txt")), "inputs/request.txt");
        assert_eq!(ws.ref_for(Path::new("inputs/request.txt")), "inputs/request.txt");
        assert_eq!(
            ws.ref_for(&ws.root.join("artifacts/proposals/r1/proposal_set.json")),
            "artifacts/proposals/r1/proposal_set.json"
        );
    }

    #[test]
    fn test_ref_for_external_paths() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let file = outside.path().join("request.txt");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(ws.ref_for(&file), "[external]:request.txt");
        assert_eq!(ws.ref_for(Path::new("../elsewhere.txt")), "[external]:elsewhere.txt");
    }

    #[test]
    #[serial]
    fn test_resolve_defaults_to_cwd() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        let ws = Workspace::resolve(None, &Config::default()).unwrap();

        assert_eq!(ws.root, temp_dir.path().canonicalize().unwrap());
    }
}
