//! Logger service restart.
//!
//! Issued when system mode is on and a sensor has gone stale. Runs
//! `systemctl restart <service_name>`.

use crate::command::{CommandError, CommandOutput, CommandRunner};

const RESTART_TITLE: &str = "Logger service restart";

/// Allowed service name characters: alphanumeric, hyphen, underscore, dot.
/// Prevents argument injection via the configured service name.
pub fn is_safe_service_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Restart the logger service.
///
/// Failures of the command itself are logged by the runner.
pub async fn restart_service<R: CommandRunner>(
    runner: &R,
    service_name: &str,
) -> Result<CommandOutput, CommandError> {
    tracing::error!(service = %service_name, "Measurements are stale, restarting logger service");

    if !is_safe_service_name(service_name) {
        tracing::error!(service = %service_name, "Refusing to restart: invalid service name");
        return Err(CommandError::Rejected {
            title: RESTART_TITLE.to_string(),
            reason: format!("invalid service name '{service_name}'"),
        });
    }

    let args = vec!["restart".to_string(), service_name.to_string()];
    runner.run("systemctl", &args, RESTART_TITLE).await
}
