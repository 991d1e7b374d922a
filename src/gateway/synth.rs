//! Synthesized execution truth for state transitions.
//!
//! An accepted state transition needs no backend process: the gateway
//! writes the canonical `key=value` record itself, with a fixed zero exit
//! code, into a run directory it creates fresh.

use crate::decision::{RunId, TransitionRecord};
use crate::error::{GateError, Result};
use crate::fs::atomic_write_file;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the authoritative output file inside a run directory.
pub const EXECUTION_TRUTH_FILE: &str = "stdout.raw.kv";

/// Name of the exit code file written next to synthesized truth.
pub const EXIT_CODE_FILE: &str = "exit_code";

/// Exit code recorded for every synthesized transition.
pub const SYNTHESIZED_EXIT_CODE: i32 = 0;

/// Write `record` into a new directory under `run_root`.
///
/// The directory is `transition_<run_id>`, suffixed `_1`, `_2`, ... if that
/// name is already taken. An existing directory is never reused.
pub fn write_transition_run(
    run_root: &Path,
    run_id: &RunId,
    record: &TransitionRecord,
) -> Result<PathBuf> {
    fs::create_dir_all(run_root).map_err(|e| {
        GateError::UserError(format!(
            "failed to create run root '{}': {}",
            run_root.display(),
            e
        ))
    })?;

    let run_dir = create_fresh_dir(run_root, &format!("transition_{}", run_id))?;

    atomic_write_file(run_dir.join(EXECUTION_TRUTH_FILE), &record.to_kv())?;
    atomic_write_file(
        run_dir.join(EXIT_CODE_FILE),
        &format!("{}\n", SYNTHESIZED_EXIT_CODE),
    )?;

    Ok(run_dir)
}

fn create_fresh_dir(parent: &Path, base: &str) -> Result<PathBuf> {
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            base.to_string()
        } else {
            format!("{}_{}", base, suffix)
        };
        let path = parent.join(name);

        match fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && suffix < u32::MAX => suffix += 1,
            Err(e) => {
                return Err(GateError::UserError(format!(
                    "failed to create run directory '{}': {}",
                    path.display(),
                    e
                )));
            }
        }
    }
}
