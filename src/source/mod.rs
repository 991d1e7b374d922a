//! The candidate acquisition seam.
//!
//! A candidate source turns raw input bytes into opaque candidate bytes. The
//! source is chosen once from config ([`EngineKind`]) and called through
//! [`acquire_candidates`] exactly once per run. Whatever goes wrong inside the
//! source collapses to empty bytes, which the decision engine reads as an
//! empty candidate set.

mod deterministic;
mod opaque;

pub use deterministic::{DeterministicSource, INPUT_NOT_UTF8, INPUT_TOO_LONG};
pub use opaque::OpaqueBytes;

use crate::config::EngineKind;
use crate::error::Result;
use crate::guard::SeamTicket;
use tracing::{debug, warn};

/// Produces candidate interpretations of a raw input.
pub trait CandidateSource {
    /// Short name for logs and the manifest.
    fn name(&self) -> &'static str;

    /// Interpret `raw_input`. The output is never inspected by the caller.
    fn propose(&self, raw_input: &[u8]) -> Result<OpaqueBytes>;
}

/// Source bound when no engine is configured: always empty bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSource;

impl CandidateSource for NullSource {
    fn name(&self) -> &'static str {
        "none"
    }

    fn propose(&self, _raw_input: &[u8]) -> Result<OpaqueBytes> {
        Ok(OpaqueBytes::new(Vec::new()))
    }
}

/// Resolve the configured engine to a source.
pub fn bind(kind: EngineKind) -> Box<dyn CandidateSource> {
    match kind {
        EngineKind::Deterministic => Box::new(DeterministicSource),
        EngineKind::None => Box::new(NullSource),
    }
}

/// Call `source` once for this run.
///
/// Consumes the seam ticket. A failing source yields empty bytes; there are
/// no retries.
pub fn acquire_candidates(
    source: &dyn CandidateSource,
    ticket: SeamTicket,
    raw_input: &[u8],
) -> OpaqueBytes {
    debug!(run_id = %ticket.run_id(), source = source.name(), "acquiring candidates");
    match source.propose(raw_input) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                run_id = %ticket.run_id(),
                source = source.name(),
                error = %e,
                "candidate source failed; continuing with no candidates"
            );
            OpaqueBytes::new(Vec::new())
        }
    }
}
