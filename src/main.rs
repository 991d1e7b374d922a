//! Gatekeep: authority-separated command gateway.
//!
//! This is the main entry point for the `gatekeep` CLI. It parses arguments,
//! initializes logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

mod candidate;
mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod gateway;
pub mod guard;
pub mod locator;
mod logging;
pub mod observe;
mod pipeline;
pub mod source;
pub mod state_machine;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.global.verbose);

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
