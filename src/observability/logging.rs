//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber
//! - Resolve the log filter from `RUST_LOG` or configuration

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("spot_watch={}", level)
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured `level`.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
