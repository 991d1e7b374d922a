//! Command implementations for gatekeep.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, and the shared config/workspace resolution every
//! command goes through.

mod check;
mod decide;
mod run;

pub use check::cmd_check;
pub use decide::cmd_decide;
pub use run::cmd_run;

use crate::cli::{Cli, Command, GlobalArgs};
use crate::config::Config;
use crate::context::Workspace;
use crate::error::{GateError, Result};
use std::env;
use std::path::PathBuf;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(&cli.global, args),
        Command::Decide(args) => cmd_decide(&cli.global, args),
        Command::Check(args) => cmd_check(args),
    }
}

/// Load the config and resolve the workspace for `global`.
///
/// An explicit `--config` must exist. Without it, `<root>/gatekeep.yaml` is
/// used if present and defaults otherwise.
pub(crate) fn resolve_workspace(global: &GlobalArgs) -> Result<(Config, Workspace)> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => env::current_dir().map_err(|e| {
            GateError::UserError(format!("failed to get current working directory: {}", e))
        })?,
    };

    let config = match &global.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Workspace::config_path(&root))?,
    };

    let ws = Workspace::resolve(Some(&root), &config)?;
    Ok((config, ws))
}

/// Resolve `path` against the process working directory.
pub(crate) fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir().map_err(|e| {
        GateError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;
    use crate::test_support::{DirGuard, create_test_workspace};
    use serial_test::serial;

    #[test]
    fn test_resolve_workspace_reads_root_config() {
        let temp_dir = create_test_workspace();
        std::fs::write(temp_dir.path().join("gatekeep.yaml"), "engine: none\n").unwrap();

        let global = GlobalArgs {
            root: Some(temp_dir.path().to_path_buf()),
            ..GlobalArgs::default()
        };
        let (config, ws) = resolve_workspace(&global).unwrap();

        assert_eq!(config.engine, EngineKind::None);
        assert_eq!(ws.root, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = create_test_workspace();
        let global = GlobalArgs {
            root: Some(temp_dir.path().to_path_buf()),
            config: Some(temp_dir.path().join("missing.yaml")),
            ..GlobalArgs::default()
        };
        assert!(resolve_workspace(&global).is_err());
    }

    #[test]
    fn test_invalid_root_config_is_error() {
        let temp_dir = create_test_workspace();
        std::fs::write(temp_dir.path().join("gatekeep.yaml"), "bogus: 1\n").unwrap();
        let global = GlobalArgs {
            root: Some(temp_dir.path().to_path_buf()),
            ..GlobalArgs::default()
        };
        assert!(resolve_workspace(&global).is_err());
    }

    #[test]
    #[serial]
    fn test_root_defaults_to_cwd() {
        let temp_dir = create_test_workspace();
        let _guard = DirGuard::new(temp_dir.path());

        let (config, ws) = resolve_workspace(&GlobalArgs::default()).unwrap();

        assert_eq!(config.backend_command, "sh scripts/run_backend.sh");
        assert_eq!(ws.root, temp_dir.path().canonicalize().unwrap());
    }
}
