//! Operator command execution.
//!
//! # Responsibilities
//! - Run shell commands through `sh -c`
//! - Bound each command by a timeout, killing it on expiry
//! - Expose signal details to commands through environment variables
//!
//! # Design Decisions
//! - Commands run sequentially in configured order
//! - A failing command never stops the remaining ones

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::observability::metrics;
use crate::scheduler::ScheduleDecision;
use crate::signal::TerminationSignal;

/// Errors from running a single operator command.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: ExitStatus },

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Runs operator commands with a shared timeout and environment.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
    env: Vec<(String, String)>,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            env: Vec::new(),
        }
    }

    /// Add an environment variable for every command.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Export `SPOT_WATCH_KIND`, `SPOT_WATCH_PATH`, and `SPOT_WATCH_ACTION`.
    pub fn with_signal(self, signal: &TerminationSignal) -> Self {
        let runner = self
            .with_env("SPOT_WATCH_KIND", signal.kind.as_str())
            .with_env("SPOT_WATCH_PATH", signal.path.clone());
        match &signal.action {
            Some(action) => runner.with_env("SPOT_WATCH_ACTION", action.clone()),
            None => runner,
        }
    }

    /// Export `SPOT_WATCH_DEADLINE` and `SPOT_WATCH_FIRE_AT` as RFC 3339.
    pub fn with_decision(self, decision: &ScheduleDecision) -> Self {
        self.with_env("SPOT_WATCH_DEADLINE", decision.deadline.to_rfc3339())
            .with_env("SPOT_WATCH_FIRE_AT", decision.fire_at.to_rfc3339())
    }

    /// Run one command to completion.
    pub async fn run(&self, command: &str) -> Result<(), ActionError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ActionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let waited = timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(ActionError::Spawn {
                    command: command.to_string(),
                    source,
                })
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(command, error = %e, "Failed to kill timed-out command");
                }
                return Err(ActionError::Timeout {
                    command: command.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::Failed {
                command: command.to_string(),
                status,
            })
        }
    }

    /// Run every command in order, returning the failures.
    pub async fn run_all(&self, commands: &[String]) -> Vec<ActionError> {
        let mut failures = Vec::new();

        for command in commands {
            tracing::info!(command = %command, "Running action");
            match self.run(command).await {
                Ok(()) => {
                    metrics::record_action(true);
                    tracing::info!(command = %command, "Action completed");
                }
                Err(e) => {
                    metrics::record_action(false);
                    tracing::error!(error = %e, "Action failed");
                    failures.push(e);
                }
            }
        }

        failures
    }
}
