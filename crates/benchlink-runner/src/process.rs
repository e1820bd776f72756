//! Subprocess execution

use tokio::process::Command;
use tracing::{debug, warn};

use crate::command_spec::CommandSpec;
use crate::RunnerError;

const STDERR_TAIL_LINES: usize = 10;

/// Run a command to completion, capturing output.
///
/// A non-zero exit becomes [`RunnerError::Failed`] carrying the last lines
/// of stderr, which is where the generator writes its diagnostics.
pub async fn run_command(spec: &CommandSpec) -> Result<(), RunnerError> {
    if let Some(cwd) = spec.cwd() {
        if !cwd.is_dir() {
            return Err(RunnerError::MissingWorkingDir {
                path: cwd.to_path_buf(),
            });
        }
    }

    debug!(command = %spec, "running generator command");
    let mut command = Command::new(spec.program());
    command.args(spec.args()).kill_on_drop(true);
    if let Some(cwd) = spec.cwd() {
        command.current_dir(cwd);
    }

    let output = command
        .output()
        .await
        .map_err(|source| RunnerError::Spawn {
            program: spec.program().to_string(),
            source,
        })?;

    if output.status.success() {
        debug!(command = %spec, "generator command succeeded");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: Vec<&str> = stderr
        .lines()
        .rev()
        .take(STDERR_TAIL_LINES)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let stderr_tail = tail.join("\n");

    match output.status.code() {
        Some(code) => {
            warn!(command = %spec, code, "generator command failed");
            Err(RunnerError::Failed {
                program: spec.program().to_string(),
                code,
                stderr_tail,
            })
        }
        None => Err(RunnerError::Killed {
            program: spec.program().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let spec = CommandSpec::new("true");
        run_command(&spec).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_command_reports_code() {
        let spec = CommandSpec::new("false");
        let err = run_command(&spec).await.unwrap_err();
        assert!(matches!(err, RunnerError::Failed { code: 1, .. }));
    }

    #[tokio::test]
    async fn test_unknown_program_is_spawn_error() {
        let spec = CommandSpec::new("benchlink-no-such-program");
        let err = run_command(&spec).await.unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_missing_working_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("true").current_dir(tempdir.path().join("absent"));
        let err = run_command(&spec).await.unwrap_err();
        assert!(matches!(err, RunnerError::MissingWorkingDir { .. }));
    }

    #[tokio::test]
    async fn test_runs_in_existing_working_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("true").current_dir(tempdir.path());
        run_command(&spec).await.unwrap();
    }
}
