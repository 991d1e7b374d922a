use crate::decision::{RunId, decide};
use crate::error::Result;
use crate::gateway::{Backend, BackendOutput, EXECUTION_TRUTH_FILE};
use serde_json::{Value, json};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Backend command used by test workspaces.
pub(crate) const TEST_BACKEND_COMMAND: &str = "sh scripts/run_backend.sh";

/// Shell backend: writes execution truth into a fresh `mktemp` directory
/// under the run root and reports it.
const TEST_BACKEND_SCRIPT: &str = r#"#!/bin/sh
input="$2"
mkdir -p artifacts/run
dir=$(mktemp -d artifacts/run/backend_XXXXXX)
printf 'status=ok\ninput_bytes=%s\n' "$(wc -c < "$input" | tr -d ' ')" > "$dir/stdout.raw.kv"
echo 0 > "$dir/exit_code"
echo "run_directory: $dir"
"#;

/// A workspace with a config file and a working shell backend.
pub(crate) fn create_test_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join("scripts")).unwrap();
    std::fs::write(root.join("scripts").join("run_backend.sh"), TEST_BACKEND_SCRIPT).unwrap();
    std::fs::write(
        root.join("gatekeep.yaml"),
        format!("backend_command: \"{}\"\n", TEST_BACKEND_COMMAND),
    )
    .unwrap();
    std::fs::create_dir_all(root.join("inputs")).unwrap();

    temp_dir
}

/// Write an input file under `<root>/inputs/`.
pub(crate) fn write_input(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join("inputs").join(name);
    std::fs::create_dir_all(root.join("inputs")).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Wire form of a candidate set with the given proposals.
pub(crate) fn candidate_set(proposals: Vec<Value>) -> Value {
    json!({
        "schema_version": "m1.0",
        "input": { "raw": "test input" },
        "proposals": proposals
    })
}

pub(crate) fn route_candidate(intent: &str, target: &str) -> Value {
    json!({
        "kind": "ROUTE_CANDIDATE",
        "payload": { "intent": intent, "slots": { "target": target } }
    })
}

pub(crate) fn route_candidate_with_mode(intent: &str, target: &str, mode: &str) -> Value {
    json!({
        "kind": "ROUTE_CANDIDATE",
        "payload": { "intent": intent, "slots": { "target": target, "mode": mode } }
    })
}

pub(crate) fn transition_candidate(event_token: &str) -> Value {
    json!({
        "kind": "STATE_TRANSITION_REQUEST",
        "payload": { "event_token": event_token }
    })
}

/// Serialized decision record for `proposals` under `run_id`.
pub(crate) fn decision_value(proposals: Vec<Value>, run_id: &str) -> Value {
    let run_id = RunId::new(run_id).unwrap();
    decide(
        &candidate_set(proposals),
        &run_id,
        "inputs/request.txt",
        "artifacts/proposals/test/proposal_set.json",
    )
    .to_value()
    .unwrap()
}

/// In-process backend that behaves like the real one: each call creates a
/// new directory under `run_root`, writes execution truth, and reports the
/// directory relative to `working_dir`.
pub(crate) struct ScriptedBackend {
    pub(crate) working_dir: PathBuf,
    pub(crate) run_root: PathBuf,
    pub(crate) exit_code: i32,
    pub(crate) report_directory: bool,
    pub(crate) calls: Rc<Cell<usize>>,
}

impl ScriptedBackend {
    pub(crate) fn new(working_dir: &Path, run_root: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            run_root: run_root.to_path_buf(),
            exit_code: 0,
            report_directory: true,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl Backend for ScriptedBackend {
    fn invoke(&self, input: &Path) -> Result<BackendOutput> {
        let call = self.calls.get() + 1;
        self.calls.set(call);

        let dir = self.run_root.join(format!("backend_{}", call));
        std::fs::create_dir_all(&dir).unwrap();
        let content = std::fs::read_to_string(input).unwrap();
        std::fs::write(
            dir.join(EXECUTION_TRUTH_FILE),
            format!("status=ok\ninput={}\n", content.trim()),
        )
        .unwrap();

        let reported = dir.strip_prefix(&self.working_dir).unwrap_or(&dir);
        let stdout = if self.report_directory {
            format!("backend starting\nrun_directory: {}\n", reported.display())
        } else {
            "backend starting\n".to_string()
        };

        Ok(BackendOutput {
            exit_code: Some(self.exit_code),
            stdout,
            stderr: String::new(),
        })
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
