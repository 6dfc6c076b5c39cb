//! Metrics collection and exposition.
//!
//! # Metrics
//! - `spot_watch_poll_cycles_total` (counter): completed polling cycles
//! - `spot_watch_fetch_total` (counter): metadata reads by path, outcome
//! - `spot_watch_signals_total` (counter): confirmed signals by kind
//! - `spot_watch_actions_total` (counter): operator commands by outcome

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_poll_cycle() {
    metrics::counter!("spot_watch_poll_cycles_total").increment(1);
}

pub fn record_fetch(path: &str, outcome: &'static str) {
    metrics::counter!(
        "spot_watch_fetch_total",
        "path" => path.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_signal(kind: &'static str) {
    metrics::counter!("spot_watch_signals_total", "kind" => kind).increment(1);
}

pub fn record_action(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("spot_watch_actions_total", "outcome" => outcome).increment(1);
}
