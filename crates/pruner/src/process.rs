//! External process plumbing shared by the git and test-runner collaborators

use crate::result::{PrunerError, PrunerResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Exit status and captured output of an external process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutcome {
    /// True only for a clean zero exit
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Executable named by `env_var`, or `default` when unset
pub fn resolve_binary(env_var: &str, default: &str) -> PrunerResult<PathBuf> {
    match std::env::var_os(env_var) {
        Some(value) if value.is_empty() => Err(PrunerError::settings(format!(
            "{env_var} is set but empty. Provide a valid executable path or unset it."
        ))),
        Some(value) => Ok(PathBuf::from(value)),
        None => Ok(PathBuf::from(default)),
    }
}

/// Run a program to completion, capturing stdout and stderr
///
/// A non-zero exit is reported through [`ProcessOutcome`], not as an error.
pub async fn run_captured(program: &Path, args: &[OsString], cwd: &Path) -> PrunerResult<ProcessOutcome> {
    tracing::debug!(program = %program.display(), ?args, cwd = %cwd.display(), "spawning");

    let output = tokio::process::Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| PrunerError::ProcessSpawn {
            program: program.display().to_string(),
            source,
        })?;

    let outcome = ProcessOutcome {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    tracing::debug!(program = %program.display(), exit_code = ?outcome.exit_code, "process exited");
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_requires_zero_exit() {
        let mut outcome = ProcessOutcome::default();
        assert!(!outcome.success());
        outcome.exit_code = Some(1);
        assert!(!outcome.success());
        outcome.exit_code = Some(0);
        assert!(outcome.success());
    }

    #[test]
    fn test_resolve_binary_default() {
        let binary = resolve_binary("PRUNER_TEST_UNSET_BINARY_VARIABLE", "dotnet").unwrap();
        assert_eq!(binary, PathBuf::from("dotnet"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = run_captured(
            Path::new("pruner-definitely-not-a-real-program"),
            &[],
            Path::new("."),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PrunerError::ProcessSpawn { .. }));
    }
}
