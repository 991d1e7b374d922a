//! Deterministic recursive scan for execution-truth files.

use crate::error::{GateError, Result};
use crate::gateway::EXECUTION_TRUTH_FILE;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Every execution-truth file under `root`, in sorted path order.
///
/// Entries are visited by name, never by modification time. Symlinks are
/// not followed. A missing root yields nothing.
pub fn find_truth_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(scan_error(dir, e)),
    };

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| scan_error(dir, e))?;
        let file_type = entry.file_type().map_err(|e| scan_error(dir, e))?;
        children.push((entry.file_name(), file_type));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, file_type) in children {
        let path = dir.join(&name);
        if file_type.is_dir() {
            walk(&path, found)?;
        } else if file_type.is_file() && name == EXECUTION_TRUTH_FILE {
            found.push(path);
        }
    }

    Ok(())
}

fn scan_error(path: &Path, e: std::io::Error) -> GateError {
    GateError::UserError(format!("failed to scan '{}': {}", path.display(), e))
}
