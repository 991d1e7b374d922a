//! Observability writers: `manifest.json` and `trace.jsonl`.
//!
//! Both are derived, non-authoritative records of a run. Nothing in the
//! decision or execution path reads them.

mod manifest;
mod trace;

pub use manifest::{
    ArtifactKind, MANIFEST_FILE, MANIFEST_SCHEMA_VERSION, ManifestBuilder, Stage, StageStatus,
};
pub use trace::{TRACE_FILE, TraceEvent, TraceRecord, TraceStage, TraceWriter};
