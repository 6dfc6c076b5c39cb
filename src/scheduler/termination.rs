//! Watch-then-wait orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;

use crate::lifecycle::ShutdownListener;
use crate::metadata::MetadataClient;
use crate::scheduler::decision::{schedule, ScheduleDecision};
use crate::signal::{SignalPath, SignalPoller, TerminationSignal};

/// Wall-clock source used for deadline arithmetic.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Callback invoked for signals that carry no deadline.
pub type AdvisoryHook = Box<dyn Fn(&TerminationSignal) + Send + Sync>;

/// How a deadline wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Drives a [`SignalPoller`] until a deadline appears, then waits until the
/// configured lead time before it.
pub struct TerminationScheduler<C> {
    poller: SignalPoller<C>,
    paths: Vec<SignalPath>,
    shutdown: ShutdownListener,
    clock: Clock,
    on_advisory: Option<AdvisoryHook>,
}

impl<C: MetadataClient> TerminationScheduler<C> {
    /// Create a scheduler watching `paths` in priority order.
    pub fn new(poller: SignalPoller<C>, paths: Vec<SignalPath>, shutdown: ShutdownListener) -> Self {
        Self {
            poller,
            paths,
            shutdown,
            clock: Arc::new(Utc::now),
            on_advisory: None,
        }
    }

    /// Replace the wall clock.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Register a callback for advisory (deadline-less) signals.
    pub fn on_advisory<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TerminationSignal) + Send + Sync + 'static,
    {
        self.on_advisory = Some(Box::new(hook));
        self
    }

    pub fn poller(&self) -> &SignalPoller<C> {
        &self.poller
    }

    /// Compute the decision for a deadline-bearing signal against this
    /// scheduler's clock.
    ///
    /// # Panics
    ///
    /// Panics if `signal` carries no deadline.
    pub fn schedule(&self, signal: &TerminationSignal, lead_time: Duration) -> ScheduleDecision {
        schedule(signal, lead_time, || (self.clock)())
    }

    /// Sleep for `decision.wait_duration` unless cancelled first.
    pub async fn wait_until(&mut self, decision: ScheduleDecision) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::info!(fire_at = %decision.fire_at, "Deadline wait cancelled");
                WaitOutcome::Cancelled
            }
            _ = sleep(decision.wait_duration) => WaitOutcome::Elapsed,
        }
    }

    /// Watch every configured path until a deadline is observed, then block
    /// until `lead_time` before it.
    ///
    /// Advisory signals are handed to the advisory hook and their path is
    /// dropped from the watch set. Returns `None` on cancellation, or when no
    /// deadline-bearing path is left to watch.
    pub async fn schedule_and_wait(
        &mut self,
        lead_time: Duration,
        poll_interval: Duration,
    ) -> Option<ScheduleDecision> {
        let mut remaining = self.paths.clone();

        loop {
            if !remaining.iter().any(|p| p.kind.carries_deadline()) {
                tracing::warn!("No deadline-bearing path left to watch");
                return None;
            }

            let signal = self
                .poller
                .await_signal(&remaining, poll_interval, &mut self.shutdown)
                .await?;

            if signal.deadline.is_none() {
                tracing::warn!(
                    kind = %signal.kind,
                    path = %signal.path,
                    notice_time = ?signal.notice_time,
                    "Advisory interruption signal received"
                );
                if let Some(hook) = &self.on_advisory {
                    hook(&signal);
                }
                remaining.retain(|p| p.path != signal.path);
                continue;
            }

            let decision = self.schedule(&signal, lead_time);
            tracing::warn!(
                action = signal.action.as_deref().unwrap_or("unknown"),
                deadline = %decision.deadline,
                fire_at = %decision.fire_at,
                wait_ms = decision.wait_duration.as_millis() as u64,
                "Interruption scheduled"
            );

            return match self.wait_until(decision).await {
                WaitOutcome::Elapsed => Some(decision),
                WaitOutcome::Cancelled => None,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::metadata::fake::{FakeMetadata, Reply};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const REBALANCE: &str = "events/recommendations/rebalance";
    const ACTION: &str = "spot/instance-action";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn scheduler(fake: FakeMetadata, shutdown: &Shutdown) -> TerminationScheduler<FakeMetadata> {
        TerminationScheduler::new(
            SignalPoller::new(fake),
            vec![SignalPath::rebalance(), SignalPath::instance_action()],
            shutdown.subscribe(),
        )
        .with_clock(fixed_now)
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_out_lead_time() {
        // 2024-05-01T12:05:00Z is five minutes after the fixed clock.
        let fake = FakeMetadata::new().persistent(
            ACTION,
            Reply::Present(r#"{"action": "terminate", "time": "2024-05-01T12:05:00Z"}"#),
        );
        let shutdown = Shutdown::new();
        let mut scheduler = scheduler(fake, &shutdown);

        let start = Instant::now();
        let decision = scheduler
            .schedule_and_wait(Duration::from_secs(30), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(decision.wait_duration, Duration::from_secs(270));
        assert_eq!(start.elapsed(), Duration::from_secs(270));
        assert_eq!(
            decision.fire_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 4, 30).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_imminent_deadline_fires_immediately() {
        let fake = FakeMetadata::new().persistent(
            ACTION,
            Reply::Present(r#"{"action": "terminate", "time": "2024-05-01T12:00:10Z"}"#),
        );
        let shutdown = Shutdown::new();
        let mut scheduler = scheduler(fake, &shutdown);

        let start = Instant::now();
        let decision = scheduler
            .schedule_and_wait(Duration::from_secs(30), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(decision.is_immediate());
        assert_eq!(decision.fire_at, fixed_now());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_then_action() {
        let fake = FakeMetadata::new()
            .persistent(REBALANCE, Reply::Present(r#"{"noticeTime": "2024-05-01T11:59:00Z"}"#))
            .script(
                ACTION,
                vec![
                    Reply::Absent,
                    Reply::Absent,
                    Reply::Present(r#"{"action": "stop", "time": "2024-05-01T12:02:00Z"}"#),
                ],
            );
        let shutdown = Shutdown::new();
        let advisories = Arc::new(AtomicUsize::new(0));
        let seen = advisories.clone();
        let mut scheduler = scheduler(fake, &shutdown).on_advisory(move |signal| {
            assert!(signal.notice_time.is_some());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let decision = scheduler
            .schedule_and_wait(Duration::from_secs(60), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(advisories.load(Ordering::SeqCst), 1);
        assert_eq!(decision.wait_duration, Duration::from_secs(60));
        assert_eq!(scheduler.poller().client().calls(REBALANCE), 1);
        // The first cycle stops at the rebalance path; action is read from the second call on.
        assert_eq!(scheduler.poller().client().calls(ACTION), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_wait() {
        let fake = FakeMetadata::new().persistent(
            ACTION,
            Reply::Present(r#"{"action": "terminate", "time": "2024-05-01T13:00:00Z"}"#),
        );
        let shutdown = Shutdown::new();
        let mut scheduler = scheduler(fake, &shutdown);

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(10)).await;
            trigger.trigger();
        });

        let start = Instant::now();
        let result = scheduler
            .schedule_and_wait(Duration::from_secs(30), Duration::from_secs(5))
            .await;

        assert!(result.is_none());
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_returns_early_on_cancel() {
        let shutdown = Shutdown::new();
        let mut scheduler = scheduler(FakeMetadata::new(), &shutdown);
        let decision = ScheduleDecision {
            wait_duration: Duration::from_secs(600),
            fire_at: fixed_now(),
            deadline: fixed_now(),
        };

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            trigger.trigger();
        });

        let start = Instant::now();
        assert_eq!(scheduler.wait_until(decision).await, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_advisory_paths_gives_up() {
        let shutdown = Shutdown::new();
        let mut scheduler = TerminationScheduler::new(
            SignalPoller::new(FakeMetadata::new().persistent(REBALANCE, Reply::Present(""))),
            vec![SignalPath::rebalance()],
            shutdown.subscribe(),
        );

        let result = scheduler
            .schedule_and_wait(Duration::from_secs(30), Duration::from_secs(5))
            .await;
        assert!(result.is_none());
    }
}
