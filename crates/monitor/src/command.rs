//! External command invocation.
//!
//! Commands run to completion with no timeout: a hung command blocks the
//! sampling loop until it exits.

use std::future::Future;
use std::time::Instant;

use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Command '{title}' could not be started: {source}")]
    Spawn {
        title: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{title}' failed (exit {code}): {stderr}")]
    Failed {
        title: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Command '{title}' rejected: {reason}")]
    Rejected { title: String, reason: String },
}

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub duration_ms: u64,
}

/// Runs the external commands used by the backup, restart and UPS
/// collaborators.
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        title: &str,
    ) -> impl Future<Output = Result<CommandOutput, CommandError>>;
}

/// Spawns real processes via [`run_command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        title: &str,
    ) -> Result<CommandOutput, CommandError> {
        run_command(program, args, title).await
    }
}

/// Run `program` with `args`, capturing output.
///
/// Non-zero exit and spawn failures are logged at error level and returned.
pub async fn run_command(
    program: &str,
    args: &[String],
    title: &str,
) -> Result<CommandOutput, CommandError> {
    let start = Instant::now();
    tracing::debug!(program, ?args, title, "Running command");

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| {
            tracing::error!(title, program, error = %source, "Command could not be started");
            CommandError::Spawn {
                title: title.to_string(),
                source,
            }
        })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if output.status.success() {
        tracing::info!(title, duration_ms, "Command succeeded");
        tracing::debug!(title, stdout = %stdout.trim(), "Command output");
        return Ok(CommandOutput {
            stdout,
            duration_ms,
        });
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let code = output.status.code().unwrap_or(-1);
    tracing::error!(title, program, code, stderr = %stderr, duration_ms, "Command failed");

    Err(CommandError::Failed {
        title: title.to_string(),
        code,
        stdout,
        stderr,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let out = run_command("sh", &args(&["-c", "echo hello"]), "echo").await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure_with_stderr() {
        let err = run_command("sh", &args(&["-c", "echo oops >&2; exit 3"]), "fail")
            .await
            .unwrap_err();
        assert_matches!(err, CommandError::Failed { code: 3, ref stderr, .. } if stderr == "oops");
    }

    #[tokio::test]
    async fn system_runner_spawns_process() {
        let out = SystemRunner
            .run("sh", &args(&["-c", "printf ok"]), "printf")
            .await
            .unwrap();
        assert_eq!(out.stdout, "ok");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = run_command("/nonexistent/sensorwatch-test-bin", &[], "missing")
            .await
            .unwrap_err();
        assert_matches!(err, CommandError::Spawn { .. });
    }
}
