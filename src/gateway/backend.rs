//! Backend process invocation.
//!
//! The backend is a frozen external executable. It is invoked as
//! `<command> --input <path>`, awaited without a timeout, and its output is
//! captured whole. It reports where it wrote its results with a
//! `run_directory: <path>` line on stdout or stderr.

use crate::error::{GateError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of one backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutput {
    /// Exit code of the process (None if killed by a signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl BackendOutput {
    /// The self-reported run directory, from stdout then stderr.
    pub fn reported_run_directory(&self) -> Option<&str> {
        parse_run_directory(&self.stdout).or_else(|| parse_run_directory(&self.stderr))
    }
}

/// Something that can execute an accepted route.
pub trait Backend {
    /// Invoke the backend once with `input`. No retries.
    fn invoke(&self, input: &Path) -> Result<BackendOutput>;

    /// Directory relative run-directory reports are resolved against.
    fn working_dir(&self) -> &Path;
}

/// Backend run as a child process from a shell-words command string.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    command: String,
}

impl ProcessBackend {
    /// Parse `command` with shell-words. A relative program path containing a
    /// separator is resolved against `working_dir`.
    pub fn from_command(command: &str, working_dir: impl Into<PathBuf>) -> Result<Self> {
        let working_dir = working_dir.into();
        let args = shell_words::split(command).map_err(|e| {
            GateError::UserError(format!(
                "failed to parse backend command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command, e
            ))
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(GateError::UserError(format!(
                "backend command is empty after parsing: '{}'",
                command
            )));
        };

        let program_path = Path::new(program);
        let program = if program_path.is_relative() && program_path.components().count() > 1 {
            working_dir.join(program_path)
        } else {
            program_path.to_path_buf()
        };

        Ok(Self {
            program,
            args: rest.to_vec(),
            working_dir,
            command: command.to_string(),
        })
    }

    /// The command string this backend was built from.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Backend for ProcessBackend {
    fn invoke(&self, input: &Path) -> Result<BackendOutput> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(input)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                GateError::UserError(format!(
                    "failed to execute backend '{}': {}\n\
                     Fix: check backend_command in the config file.",
                    self.program.display(),
                    e
                ))
            })?;

        Ok(BackendOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Find the first `run_directory: <path>` report in `output`.
pub fn parse_run_directory(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("run_directory:")?;
        let path = rest.trim();
        (!path.is_empty()).then_some(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_run_directory() {
        assert_eq!(
            parse_run_directory("starting\nrun_directory: artifacts/run/abc\ndone\n"),
            Some("artifacts/run/abc")
        );
        assert_eq!(
            parse_run_directory("[backend] run_directory:   /tmp/x  \n"),
            Some("/tmp/x")
        );
        assert_eq!(parse_run_directory("run_directory:\n"), None);
        assert_eq!(parse_run_directory("nothing here"), None);
    }

    #[test]
    fn test_reported_run_directory_falls_back_to_stderr() {
        let output = BackendOutput {
            exit_code: Some(0),
            stdout: "ok\n".to_string(),
            stderr: "run_directory: out/1\n".to_string(),
        };
        assert_eq!(output.reported_run_directory(), Some("out/1"));
    }

    #[test]
    fn test_from_command_resolves_relative_program() {
        let backend = ProcessBackend::from_command("./scripts/run.sh --fast", "/work").unwrap();
        assert_eq!(backend.program, Path::new("/work/./scripts/run.sh"));
        assert_eq!(backend.args, vec!["--fast"]);
        assert_eq!(backend.command(), "./scripts/run.sh --fast");

        let backend = ProcessBackend::from_command("sh 'my script.sh'", "/work").unwrap();
        assert_eq!(backend.program, Path::new("sh"));
        assert_eq!(backend.args, vec!["my script.sh"]);
    }

    #[test]
    fn test_from_command_rejects_bad_commands() {
        assert!(ProcessBackend::from_command("", "/work").is_err());
        assert!(ProcessBackend::from_command("sh 'unterminated", "/work").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_captures_output() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("backend.sh"),
            "echo \"got $2\"\necho 'run_directory: out/1' >&2\nexit 3\n",
        )
        .unwrap();

        let backend = ProcessBackend::from_command("sh backend.sh", temp_dir.path()).unwrap();
        let output = backend.invoke(Path::new("in.txt")).unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "got in.txt\n");
        assert_eq!(output.reported_run_directory(), Some("out/1"));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let backend =
            ProcessBackend::from_command("./does-not-exist", temp_dir.path()).unwrap();
        assert!(backend.invoke(Path::new("in.txt")).is_err());
    }
}
