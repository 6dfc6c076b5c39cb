//! Priority-ordered polling of metadata signal paths.
//!
//! # Responsibilities
//! - Query every watched path once per cycle, in priority order
//! - Turn present payloads into confirmed signals
//! - Keep polling through absent reads, transient failures and bad payloads
//!
//! # Design Decisions
//! - No terminal failure state: only a signal or cancellation ends the loop
//! - The first confirmed signal in a cycle wins; later paths are not read
//! - Both the fetches and the inter-cycle sleep observe cancellation

use std::time::Duration;

use tokio::time::sleep;

use crate::lifecycle::ShutdownListener;
use crate::metadata::{MetadataClient, RawMetadataResult};
use crate::observability::metrics;
use crate::signal::types::{SignalPath, TerminationSignal};

/// Turns repeated metadata reads into a confirmed [`TerminationSignal`].
pub struct SignalPoller<C> {
    client: C,
}

impl<C: MetadataClient> SignalPoller<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run a single polling cycle over `paths`.
    ///
    /// Returns the first path, in order, that yields a parseable signal.
    pub async fn poll_once(&self, paths: &[SignalPath]) -> Option<TerminationSignal> {
        for path in paths {
            let result = self.client.fetch(&path.path).await;
            metrics::record_fetch(&path.path, result.outcome());

            match result {
                RawMetadataResult::Present(payload) => {
                    match TerminationSignal::parse(path, &payload) {
                        Ok(signal) => return Some(signal),
                        Err(e) => {
                            tracing::warn!(
                                path = %path.path,
                                kind = %path.kind,
                                error = %e,
                                "Ignoring malformed signal payload"
                            );
                        }
                    }
                }
                RawMetadataResult::Absent => {
                    tracing::trace!(path = %path.path, "No signal pending");
                }
                RawMetadataResult::TransientError(e) => {
                    tracing::warn!(path = %path.path, error = %e, "Metadata read failed");
                }
            }
        }
        None
    }

    /// Poll `paths` every `poll_interval` until a signal is confirmed.
    ///
    /// Returns `None` if `shutdown` fires first.
    pub async fn await_signal(
        &self,
        paths: &[SignalPath],
        poll_interval: Duration,
        shutdown: &mut ShutdownListener,
    ) -> Option<TerminationSignal> {
        tracing::info!(
            paths = ?paths.iter().map(|p| p.path.as_str()).collect::<Vec<_>>(),
            interval_ms = poll_interval.as_millis() as u64,
            "Watching for interruption signals"
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(cycle, "Signal watch cancelled");
                    return None;
                }
                found = self.poll_once(paths) => {
                    metrics::record_poll_cycle();
                    if let Some(signal) = found {
                        metrics::record_signal(signal.kind.as_str());
                        tracing::info!(
                            cycle,
                            kind = %signal.kind,
                            path = %signal.path,
                            deadline = ?signal.deadline,
                            "Interruption signal confirmed"
                        );
                        return Some(signal);
                    }
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(cycle, "Signal watch cancelled");
                    return None;
                }
                _ = sleep(poll_interval) => {}
            }
        }
    }
}
