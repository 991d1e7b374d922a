//! Implementation of the `gatekeep run` command.
//!
//! Runs the full pipeline for one input file, prints the stage sections to
//! stderr and the single result line to stdout.

use super::{absolute, resolve_workspace};
use crate::cli::{GlobalArgs, RunArgs};
use crate::error::{GateError, Result};
use crate::gateway::{ExecutionGateway, ProcessBackend};
use crate::pipeline::{RunReport, render_sections, run_pipeline};
use crate::source::bind;
use tracing::debug;

/// Execute the `gatekeep run` command.
///
/// REJECT exits 0. An ACCEPT whose backend could not run or exited non-zero
/// is an `ExecutionFailed` error after the result line has been printed.
pub fn cmd_run(global: &GlobalArgs, args: RunArgs) -> Result<()> {
    let report = run(global, &args)?;

    if !args.quiet {
        eprint!("{}", render_sections(&report));
    }
    println!("{}", report.result_line());

    match report.failure() {
        Some(reason) => Err(GateError::ExecutionFailed(reason)),
        None => Ok(()),
    }
}

fn run(global: &GlobalArgs, args: &RunArgs) -> Result<RunReport> {
    let (config, ws) = resolve_workspace(global)?;
    let input = absolute(args.input.clone())?;

    let source = bind(config.engine);
    let backend = ProcessBackend::from_command(&config.backend_command, &ws.root)?;
    debug!(engine = %config.engine, backend = backend.command(), "bound run collaborators");
    let gateway = ExecutionGateway::new(Box::new(backend), ws.run_root.clone());

    run_pipeline(&ws, source.as_ref(), &gateway, &input, args.run_id.as_deref())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::decision::ReasonCode;
    use crate::locator::LocatorOutcome;
    use crate::test_support::{create_test_workspace, write_input};
    use std::path::Path;

    fn global(root: &Path) -> GlobalArgs {
        GlobalArgs {
            root: Some(root.to_path_buf()),
            ..GlobalArgs::default()
        }
    }

    fn args(input: &Path, run_id: &str) -> RunArgs {
        RunArgs {
            input: input.to_path_buf(),
            run_id: Some(run_id.to_string()),
            quiet: true,
        }
    }

    #[test]
    fn test_run_accept_invokes_shell_backend() {
        let temp_dir = create_test_workspace();
        let input = write_input(temp_dir.path(), "request.txt", "status of alpha");

        let report = run(&global(temp_dir.path()), &args(&input, "r1")).unwrap();

        assert!(report.record.is_accept());
        assert!(report.execution.is_success());
        let run_dir = report.execution.run_directory.clone().unwrap();
        assert!(run_dir.starts_with(temp_dir.path().canonicalize().unwrap().join("artifacts/run")));
        assert_eq!(
            std::fs::read_to_string(run_dir.join("stdout.raw.kv")).unwrap(),
            "status=ok\ninput_bytes=15\n"
        );
        assert!(matches!(report.locator, LocatorOutcome::Unique { .. }));
    }

    #[test]
    fn test_cmd_run_reject_succeeds() {
        let temp_dir = create_test_workspace();
        let input = write_input(temp_dir.path(), "request.txt", "restart beta subsystem gracefully");

        cmd_run(&global(temp_dir.path()), args(&input, "r1")).unwrap();

        assert!(!temp_dir.path().join("artifacts/run").exists());
        assert!(
            temp_dir
                .path()
                .join("artifacts/decisions/r1/decision.json")
                .is_file()
        );
    }

    #[test]
    fn test_cmd_run_engine_none_rejects() {
        let temp_dir = create_test_workspace();
        std::fs::write(
            temp_dir.path().join("gatekeep.yaml"),
            "engine: none\nbackend_command: \"sh scripts/run_backend.sh\"\n",
        )
        .unwrap();
        let input = write_input(temp_dir.path(), "request.txt", "status of alpha");

        let report = run(&global(temp_dir.path()), &args(&input, "r1")).unwrap();

        assert_eq!(
            report.record.reject_payload().unwrap().reason_code,
            ReasonCode::NoProposals
        );
    }

    #[test]
    fn test_cmd_run_failing_backend_is_execution_failure() {
        let temp_dir = create_test_workspace();
        std::fs::write(temp_dir.path().join("scripts/run_backend.sh"), "exit 4\n").unwrap();
        let input = write_input(temp_dir.path(), "request.txt", "status of alpha");

        let err = cmd_run(&global(temp_dir.path()), args(&input, "r1")).unwrap_err();

        assert!(matches!(err, GateError::ExecutionFailed(_)));
        assert_eq!(err.exit_code(), crate::exit_codes::OPERATIONAL_FAILURE);
    }

    #[test]
    fn test_cmd_run_missing_backend_fails_to_invoke() {
        let temp_dir = create_test_workspace();
        std::fs::write(
            temp_dir.path().join("gatekeep.yaml"),
            "backend_command: ./scripts/missing-backend\n",
        )
        .unwrap();
        let input = write_input(temp_dir.path(), "request.txt", "status of alpha");

        let err = cmd_run(&global(temp_dir.path()), args(&input, "r1")).unwrap_err();

        assert!(matches!(err, GateError::ExecutionFailed(_)));
    }
}
