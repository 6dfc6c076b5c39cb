//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGQUIT)
//! - Translate the first signal into a shutdown trigger
//! - Force the process to exit on a second signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers stay installed for the whole process, so the second signal is
//!   handled here rather than by the default disposition

use tokio::sync::mpsc;

use crate::lifecycle::shutdown::Shutdown;

/// Exit status used when a second signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Installed termination signal streams.
#[cfg(unix)]
pub struct TerminationSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigquit.recv() => "SIGQUIT",
        }
    }
}

/// Installed termination signal streams.
#[cfg(not(unix))]
pub struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(_) => std::future::pending().await,
        }
    }
}

/// React to a stream of signal names.
///
/// The first triggers `shutdown`; the second calls `force_exit`.
pub async fn handle_signals<F>(
    shutdown: Shutdown,
    mut signals: mpsc::Receiver<&'static str>,
    force_exit: F,
) where
    F: FnOnce(&'static str),
{
    let Some(first) = signals.recv().await else {
        return;
    };
    tracing::info!(signal = first, "Signal received, cancelling watch");
    shutdown.trigger();

    let Some(second) = signals.recv().await else {
        return;
    };
    tracing::warn!(signal = second, "Second signal received, forcing exit");
    force_exit(second);
}

/// Install handlers and spawn the tasks that turn signals into shutdown.
///
/// A second signal exits the process with [`FORCED_EXIT_CODE`].
pub fn spawn_signal_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    let (tx, rx) = mpsc::channel(4);

    match TerminationSignals::install() {
        Ok(mut signals) => {
            tokio::spawn(async move {
                loop {
                    let name = signals.recv().await;
                    if tx.send(name).await.is_err() {
                        break;
                    }
                }
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
        }
    }

    tokio::spawn(handle_signals(shutdown, rx, |_| {
        std::process::exit(FORCED_EXIT_CODE)
    }))
}
