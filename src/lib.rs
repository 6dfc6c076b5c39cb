//! Spot instance interruption watcher.
//!
//! Polls the instance metadata service for rebalance recommendations and
//! interruption notices, and blocks until a configured lead time before the
//! interruption deadline so shutdown work can run in time.

pub mod actions;
pub mod config;
pub mod lifecycle;
pub mod metadata;
pub mod observability;
pub mod scheduler;
pub mod signal;

pub use config::WatchConfig;
pub use lifecycle::Shutdown;
pub use metadata::{ImdsClient, MetadataClient, RawMetadataResult};
pub use scheduler::{ScheduleDecision, TerminationScheduler};
pub use signal::{SignalKind, SignalPath, SignalPoller, TerminationSignal};
