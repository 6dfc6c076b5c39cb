//! Termination scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! TerminationScheduler::schedule_and_wait(lead_time, poll_interval)
//!     → SignalPoller::await_signal(remaining paths)
//!     → advisory signal: hook, drop its path, poll again
//!     → deadline signal: decision.rs computes wait = deadline - lead - now
//!     → wait_until: cancellable sleep
//!     → ScheduleDecision returned to the caller, which runs its actions
//! ```
//!
//! # Design Decisions
//! - Deadline arithmetic is a pure function of (signal, lead time, clock)
//! - Wall clock is injectable; the wait itself uses Tokio's monotonic timer
//! - A deadline already inside the lead time fires immediately

pub mod decision;
pub mod termination;

pub use decision::{schedule, ScheduleDecision};
pub use termination::{AdvisoryHook, Clock, TerminationScheduler, WaitOutcome};
