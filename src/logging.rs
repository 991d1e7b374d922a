//! Diagnostic logging for gatekeep.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: diagnostics on stderr, filtered by the `-v`
//!   count. Not persisted and never part of the product output.
//!
//! - **Observability (`observe`)**: `manifest.json` and `trace.jsonl`,
//!   always written, unaffected by verbosity.
//!
//! The filter never reads `RUST_LOG`: no component consults the environment.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for a `-v` count.
pub fn filter_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Initialize the tracing subscriber. Output: stderr, compact format.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::new(filter_directive(verbosity));

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
