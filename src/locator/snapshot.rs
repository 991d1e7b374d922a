//! Snapshots of the run-directory namespace.

use crate::error::{GateError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Names of the directories directly under a run root at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(BTreeSet<String>);

impl Snapshot {
    /// Capture the directory names under `run_root`.
    ///
    /// A missing root is an empty snapshot. Symlinks and plain files are
    /// not run directories and are left out.
    pub fn capture(run_root: &Path) -> Result<Self> {
        let entries = match fs::read_dir(run_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(read_error(run_root, e)),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_error(run_root, e))?;
            let file_type = entry.file_type().map_err(|e| read_error(run_root, e))?;
            if file_type.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.insert(name.to_string());
            }
        }

        Ok(Self(names))
    }

    /// Directory names present here but not in `earlier`, sorted.
    pub fn delta(&self, earlier: &Snapshot) -> Vec<String> {
        self.0.difference(&earlier.0).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

fn read_error(path: &Path, e: std::io::Error) -> GateError {
    GateError::UserError(format!(
        "failed to read run root '{}': {}",
        path.display(),
        e
    ))
}
