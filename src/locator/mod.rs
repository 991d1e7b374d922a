//! Run directory discovery.
//!
//! After a gateway call the locator decides which newly created directory,
//! if any, holds the authoritative execution-truth file. It only looks at
//! filesystem snapshots and content hashes. Timestamps and directory naming
//! carry no meaning here.
//!
//! # Algorithm
//!
//! 1. `delta = after - before`
//! 2. candidates = entries of `delta` containing the execution-truth file
//! 3. one candidate: `UNIQUE`; more than one: `AMBIGUOUS`
//! 4. zero candidates and a known hash: scan every execution-truth file
//!    under the run root in sorted order and match by hash
//!
//! `AMBIGUOUS` and `NOT_FOUND` are ordinary outcomes, not errors.

mod scan;
mod snapshot;


pub use scan::find_truth_files;
pub use snapshot::Snapshot;

use crate::error::Result;
use crate::fs::sha256_file;
use crate::gateway::EXECUTION_TRUTH_FILE;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which discovery path produced a unique match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Found among the newly created directories.
    Delta,
    /// Found by hash in the expanded scan.
    HashScan,
}

impl Discovery {
    pub fn as_str(self) -> &'static str {
        match self {
            Discovery::Delta => "DELTA",
            Discovery::HashScan => "HASH_SCAN",
        }
    }
}

/// Result of locating the execution-truth file of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorOutcome {
    Unique {
        /// Path of the execution-truth file.
        path: PathBuf,
        sha256: String,
        via: Discovery,
    },
    NotFound,
    /// More than one candidate; none is selected.
    Ambiguous { count: usize },
}

impl LocatorOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            LocatorOutcome::Unique { .. } => "UNIQUE",
            LocatorOutcome::NotFound => "NOT_FOUND",
            LocatorOutcome::Ambiguous { .. } => "AMBIGUOUS",
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, LocatorOutcome::Unique { .. })
    }
}

/// Locate the execution-truth file produced between two snapshots.
///
/// `expected_sha256` enables the hash scan when the delta holds no
/// candidate. Without it, an empty delta is `NotFound`.
pub fn locate(
    run_root: &Path,
    before: &Snapshot,
    after: &Snapshot,
    expected_sha256: Option<&str>,
) -> Result<LocatorOutcome> {
    let delta = after.delta(before);
    let candidates: Vec<PathBuf> = delta
        .iter()
        .map(|name| run_root.join(name).join(EXECUTION_TRUTH_FILE))
        .filter(|path| path.is_file())
        .collect();

    debug!(
        delta = delta.len(),
        candidates = candidates.len(),
        "locator inspected new run directories"
    );

    let outcome = match candidates.as_slice() {
        [path] => LocatorOutcome::Unique {
            sha256: sha256_file(path)?,
            path: path.clone(),
            via: Discovery::Delta,
        },
        [] => match expected_sha256 {
            Some(expected) => scan_by_hash(run_root, expected)?,
            None => LocatorOutcome::NotFound,
        },
        many => LocatorOutcome::Ambiguous { count: many.len() },
    };

    info!(outcome = outcome.label(), "locator finished");
    Ok(outcome)
}

fn scan_by_hash(run_root: &Path, expected: &str) -> Result<LocatorOutcome> {
    let expected = expected.to_ascii_lowercase();
    let mut matches = Vec::new();

    for path in find_truth_files(run_root)? {
        if sha256_file(&path)? == expected {
            matches.push(path);
        }
    }

    debug!(matches = matches.len(), "locator hash scan finished");

    Ok(match matches.len() {
        0 => LocatorOutcome::NotFound,
        1 => LocatorOutcome::Unique {
            path: matches.remove(0),
            sha256: expected,
            via: Discovery::HashScan,
        },
        count => LocatorOutcome::Ambiguous { count },
    })
}
