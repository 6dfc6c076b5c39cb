//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/SIGQUIT → Shutdown::trigger
//!     second signal          → process exit (130)
//!
//! Shutdown (shutdown.rs):
//!     trigger → every ShutdownListener wakes
//!             → poll loop and deadline wait return early
//! ```
//!
//! # Design Decisions
//! - Cancellation is not an error; blocking calls report it as `None`
//! - Cancellation is sticky so late subscribers cannot miss it

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
