//! Interruption signal detection.
//!
//! # Data Flow
//! ```text
//! SignalPoller::await_signal(paths, interval)
//!     → for each path in priority order: MetadataClient::fetch
//!     → Present → TerminationSignal::parse (failure logged, treated as absent)
//!     → Absent / TransientError → next path
//!     → nothing confirmed → sleep(interval) → next cycle
//! ```

pub mod poller;
pub mod types;

pub use poller::SignalPoller;
pub use types::{ParseError, SignalKind, SignalPath, TerminationSignal};
