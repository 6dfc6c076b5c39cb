//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Poller / scheduler / actions produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stdout / journald
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, kind, deadline) on every signal event
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;
