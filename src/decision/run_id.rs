//! Validated run identifiers.

use crate::error::{GateError, Result};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::LazyLock;

/// Maximum run id length.
pub const MAX_RUN_ID_LENGTH: usize = 64;

/// Salt mixed into derived run ids.
const RUN_ID_SALT: &[u8] = b"GATE_RUN_ID_V1";

static RUN_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("Invalid run ID regex"));

/// Identifier of one decide -> gate -> locate cycle.
///
/// Always 1-64 characters of `[A-Za-z0-9._-]`, and never `.` or `..`, so it
/// is safe to use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Validate a user-supplied run id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        match run_id_error(&id) {
            None => Ok(Self(id)),
            Some(code) => Err(GateError::UserError(format!(
                "invalid run id '{}' ({}): expected 1-{} characters of [A-Za-z0-9._-]",
                id, code, MAX_RUN_ID_LENGTH
            ))),
        }
    }

    /// Derive a run id from the raw input bytes.
    ///
    /// `run_` followed by the first 12 hex characters of
    /// `sha256(salt || input)`, so the same input always maps to the same id.
    pub fn derive(input: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(RUN_ID_SALT);
        hasher.update(input);
        let digest = hex::encode(hasher.finalize());
        Self(format!("run_{}", &digest[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The validator code for a malformed run id, if any.
pub(crate) fn run_id_error(id: &str) -> Option<String> {
    if id.chars().count() > MAX_RUN_ID_LENGTH {
        Some(format!("RUN_ID_TOO_LONG:max={}", MAX_RUN_ID_LENGTH))
    } else if !RUN_ID_REGEX.is_match(id) {
        Some("RUN_ID_INVALID_PATTERN".to_string())
    } else if id == "." || id == ".." {
        Some("RUN_ID_RESERVED".to_string())
    } else {
        None
    }
}
