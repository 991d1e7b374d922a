//! CLI argument parsing for gatekeep.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gatekeep: authority-separated command gateway.
///
/// Short commands are interpreted into candidates (non-authoritative),
/// decided into one ACCEPT/REJECT record (authoritative), and only an
/// ACCEPT may reach the execution backend, whose `stdout.raw.kv` is the
/// sole execution truth.
#[derive(Parser, Debug)]
#[command(name = "gatekeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Workspace root (default: current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (default: <root>/gatekeep.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands for gatekeep.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline for one input.
    ///
    /// Acquires candidates, persists the decision record, executes only on
    /// ACCEPT and locates the execution truth. Prints one result line.
    Run(RunArgs),

    /// Print the canonical decision record for a candidate-set file.
    ///
    /// Pure: nothing is persisted and nothing is executed.
    Decide(DecideArgs),

    /// Structurally validate a decision record file.
    Check(CheckArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file holding the command text.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Run id (default: derived from the input bytes).
    #[arg(long)]
    pub run_id: Option<String>,

    /// Suppress the human-readable stage sections on stderr.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `decide` command.
#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Candidate-set JSON file.
    #[arg(long)]
    pub candidates: PathBuf,

    /// Run id recorded in the decision.
    #[arg(long)]
    pub run_id: String,

    /// Input ref recorded in the decision.
    #[arg(long, default_value = "[external]:input")]
    pub input_ref: String,

    /// Candidate-set ref recorded in the decision
    /// (default: the candidates path relative to the root).
    #[arg(long)]
    pub candidate_set_ref: Option<String>,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Decision record JSON file.
    pub record: PathBuf,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
