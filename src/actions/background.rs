//! Action batches that run alongside the watch.
//!
//! Rebalance commands must not hold up polling, but they must not vanish
//! when the process exits either. Every batch is tracked in a [`JoinSet`]
//! and `drain` waits for them with a bound before shutdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::actions::runner::CommandRunner;

/// Outcome of [`BackgroundActions::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Batches that ran to completion.
    pub completed: usize,
    /// Batches still running at the deadline, aborted with their commands.
    pub aborted: usize,
}

/// Tracks command batches spawned in the background.
#[derive(Clone, Default)]
pub struct BackgroundActions {
    tasks: Arc<Mutex<JoinSet<usize>>>,
}

impl BackgroundActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `commands` on a background task. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(&self, label: &'static str, runner: CommandRunner, commands: Vec<String>) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.spawn(async move {
            let failures = runner.run_all(&commands).await;
            if !failures.is_empty() {
                tracing::warn!(batch = label, failed = failures.len(), "Some background actions failed");
            }
            failures.len()
        });
    }

    /// Number of batches not yet collected.
    pub fn pending(&self) -> usize {
        match self.tasks.lock() {
            Ok(tasks) => tasks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Wait up to `grace` for every batch, then abort whatever is left.
    pub async fn drain(&self, grace: Duration) -> DrainReport {
        let mut tasks = {
            let mut guard = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *guard)
        };

        let mut report = DrainReport::default();
        if tasks.is_empty() {
            return report;
        }

        tracing::info!(
            batches = tasks.len(),
            grace_ms = grace.as_millis() as u64,
            "Waiting for background actions"
        );

        let collected = timeout(grace, async {
            let mut completed = 0;
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Background action task failed");
                }
                completed += 1;
            }
            completed
        })
        .await;

        match collected {
            Ok(completed) => report.completed = completed,
            Err(_) => {
                report.aborted = tasks.len();
                tracing::warn!(
                    aborted = report.aborted,
                    grace_ms = grace.as_millis() as u64,
                    "Background actions still running at exit, aborting them"
                );
                tasks.shutdown().await;
            }
        }
        report
    }
}
