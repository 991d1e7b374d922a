//! Configuration model for gatekeep.
//!
//! This module defines the Config struct that represents `gatekeep.yaml` at
//! the workspace root. Every field has a default, so a missing file or an
//! empty one is a valid configuration. Unknown fields are rejected.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use operations::CONFIG_FILE;
pub use types::EngineKind;
