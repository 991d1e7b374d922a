//! Exit code constants for the gatekeep CLI.
//!
//! - 0: Success (both ACCEPT and REJECT decisions)
//! - 1: Operational failure (I/O, config, backend failed to run)
//! - 2: Boundary violation (structural safety breach, invalid decision record)

/// Successful execution, including REJECT decisions.
pub const SUCCESS: i32 = 0;

/// Operational failure: bad arguments, unreadable files, backend failures.
pub const OPERATIONAL_FAILURE: i32 = 1;

/// Boundary violation: execution attempted without a valid ACCEPT, or a
/// decision record failed structural validation.
pub const BOUNDARY_VIOLATION: i32 = 2;
