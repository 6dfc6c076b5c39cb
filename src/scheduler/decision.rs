//! Deadline arithmetic.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::signal::TerminationSignal;

/// When to fire, computed from a deadline-bearing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDecision {
    /// Time left to wait before firing; zero means fire now.
    pub wait_duration: Duration,
    /// Wall-clock instant the wait ends.
    pub fire_at: DateTime<Utc>,
    /// Interruption deadline the decision was derived from.
    pub deadline: DateTime<Utc>,
}

impl ScheduleDecision {
    pub fn is_immediate(&self) -> bool {
        self.wait_duration.is_zero()
    }
}

/// Compute when to fire ahead of `signal`'s deadline.
///
/// `fire_at = deadline - lead_time`, clamped to the current time when the
/// lead time has already been eaten into. The clock is read once.
///
/// # Panics
///
/// Panics if `signal` carries no deadline. Only action signals may be
/// scheduled.
pub fn schedule<F>(signal: &TerminationSignal, lead_time: Duration, now_fn: F) -> ScheduleDecision
where
    F: FnOnce() -> DateTime<Utc>,
{
    let Some(deadline) = signal.deadline else {
        panic!(
            "cannot schedule a {} signal from '{}': it carries no deadline",
            signal.kind, signal.path
        );
    };

    let now = now_fn();
    let remaining = deadline.signed_duration_since(now);

    // A negative remaining time, or a lead time too large for chrono, both
    // mean "fire now".
    if let (Ok(remaining), Ok(lead)) = (remaining.to_std(), chrono::Duration::from_std(lead_time)) {
        if remaining > lead_time {
            if let Some(fire_at) = deadline.checked_sub_signed(lead) {
                return ScheduleDecision {
                    wait_duration: remaining - lead_time,
                    fire_at,
                    deadline,
                };
            }
        }
    }

    ScheduleDecision {
        wait_duration: Duration::ZERO,
        fire_at: now,
        deadline,
    }
}
