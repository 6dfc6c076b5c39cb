//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watcher.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::signal::SignalPath;

/// Root configuration for the spot interruption watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Instance metadata service connection settings.
    pub metadata: MetadataConfig,

    /// Signal paths and polling cadence.
    pub poller: PollerConfig,

    /// Deadline scheduling settings.
    pub scheduler: SchedulerConfig,

    /// Operator commands to run on signals.
    pub actions: ActionsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Instance metadata service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Base URL of the metadata service (e.g., "http://169.254.169.254").
    pub endpoint: String,

    /// Lifetime requested for session tokens, in seconds.
    pub token_ttl_secs: u64,

    /// Upper bound for a single fetch (token + read), in seconds.
    pub fetch_timeout_secs: u64,
}

impl MetadataConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://169.254.169.254".to_string(),
            token_ttl_secs: 21600,
            fetch_timeout_secs: 2,
        }
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Sleep between polling cycles in seconds.
    pub poll_interval_secs: u64,

    /// Paths to poll, highest priority first.
    pub paths: Vec<SignalPath>,
}

impl PollerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            paths: vec![SignalPath::rebalance(), SignalPath::instance_action()],
        }
    }
}

/// Deadline scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How long before the interruption deadline to fire, in seconds.
    pub lead_time_secs: u64,
}

impl SchedulerConfig {
    pub fn lead_time(&self) -> Duration {
        Duration::from_secs(self.lead_time_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { lead_time_secs: 30 }
    }
}

/// Operator command configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Shell commands run once the termination wait elapses.
    pub on_termination: Vec<String>,

    /// Shell commands run when a rebalance recommendation appears.
    pub on_rebalance: Vec<String>,

    /// Maximum run time per command in seconds.
    pub command_timeout_secs: u64,
}

impl ActionsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            on_termination: Vec::new(),
            on_rebalance: Vec::new(),
            command_timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
