//! Polling loop: drives a [`SnapshotSource`] on a fixed cadence.
//!
//! A session is a lazy sequence: each [`PollingSession::next`] call waits for the next
//! tick boundary, runs one collection cycle, derives network rates against the
//! previous cycle and returns the result. Boundaries are scheduled at
//! `previous_tick + interval` on the monotonic clock. A cycle that overruns the
//! interval skips the missed boundaries instead of queueing them.
//!
//! Cancellation is cooperative and only observed while waiting for a boundary, so a
//! cycle in progress always completes. A hung probe stalls its cycle; there is no
//! per-call timeout.

use futures_util::Stream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::aggregator::SnapshotSource;
use crate::error::ConfigurationError;
use crate::models::{DerivedRates, NetworkCounters, PolledSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Idle,
    Running,
    /// Ended by `cancel()`.
    Stopped,
    /// Ended because the configured duration expired.
    Completed,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Stopped | PollState::Completed)
    }
}

/// Validated interval and optional total duration (`None` runs until cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    duration: Option<Duration>,
}

impl PollConfig {
    pub fn new(interval: Duration, duration: Option<Duration>) -> Result<Self, ConfigurationError> {
        if interval.is_zero() {
            return Err(ConfigurationError::NonPositiveInterval(interval));
        }
        if let Some(d) = duration
            && d.is_zero()
        {
            return Err(ConfigurationError::InvalidDuration(format!("{:?}", d)));
        }
        Ok(Self { interval, duration })
    }

    /// Seconds as floats; zero, negative and non-finite values are rejected.
    pub fn from_secs_f64(interval: f64, duration: Option<f64>) -> Result<Self, ConfigurationError> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigurationError::InvalidIntervalSecs(interval));
        }
        let interval = Duration::try_from_secs_f64(interval)
            .map_err(|_| ConfigurationError::InvalidIntervalSecs(interval))?;
        let duration = match duration {
            None => None,
            Some(d) if d.is_finite() && d > 0.0 => Some(
                Duration::try_from_secs_f64(d)
                    .map_err(|_| ConfigurationError::InvalidDuration(d.to_string()))?,
            ),
            Some(d) => return Err(ConfigurationError::InvalidDuration(d.to_string())),
        };
        Self::new(interval, duration)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

/// Cancels a session and observes its state from outside the loop. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PollHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
    state_rx: watch::Receiver<PollState>,
}

impl PollHandle {
    /// Idempotent. Takes effect at the session's next tick boundary.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn state(&self) -> PollState {
        *self.state_rx.borrow()
    }

    /// Resolves once the session is `Stopped` or `Completed`.
    pub async fn wait_terminal(&self) -> PollState {
        let mut rx = self.state_rx.clone();
        match rx.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            // Session dropped; Drop publishes Stopped before the sender goes away
            Err(_) => PollState::Stopped,
        }
    }
}

/// Not yet started. Starting consumes it; a finished session can't be restarted.
pub struct Poller<S> {
    source: S,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn state(&self) -> PollState {
        PollState::Idle
    }

    pub fn start(
        self,
        interval: Duration,
        duration: Option<Duration>,
    ) -> Result<PollingSession<S>, ConfigurationError> {
        let config = PollConfig::new(interval, duration)?;
        Ok(PollingSession::start(self.source, config))
    }
}

/// Validates the parameters and starts a session. Nothing is collected until the first
/// `next()`.
pub fn start_polling<S: SnapshotSource>(
    source: S,
    interval: Duration,
    duration: Option<Duration>,
) -> Result<PollingSession<S>, ConfigurationError> {
    Poller::new(source).start(interval, duration)
}

pub struct PollingSession<S> {
    source: S,
    interval: Duration,
    /// `None` runs until cancelled, including when `start + duration` is past the clock's range.
    ends_at: Option<Instant>,
    /// `None` once the next boundary is past the clock's range.
    next_tick: Option<Instant>,
    sequence: u64,
    /// Counters of the previous cycle and when it finished; owned by the loop only.
    previous: Option<(Option<NetworkCounters>, Instant)>,
    cancel_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<PollState>,
    handle: PollHandle,
}

impl<S: SnapshotSource> PollingSession<S> {
    pub fn start(source: S, config: PollConfig) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(PollState::Running);
        let started_at = Instant::now();
        tracing::debug!(
            interval_ms = config.interval.as_millis() as u64,
            duration_ms = config.duration.map(|d| d.as_millis() as u64),
            "polling session started"
        );
        Self {
            source,
            interval: config.interval,
            ends_at: config.duration.and_then(|d| started_at.checked_add(d)),
            next_tick: Some(started_at),
            sequence: 0,
            previous: None,
            cancel_rx,
            state_tx,
            handle: PollHandle {
                cancel_tx: Arc::new(cancel_tx),
                state_rx,
            },
        }
    }

    pub fn handle(&self) -> PollHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> PollState {
        *self.state_tx.borrow()
    }

    /// Snapshots emitted so far.
    pub fn emitted(&self) -> u64 {
        self.sequence
    }

    /// Next snapshot, or `None` once the session is `Stopped` or `Completed`.
    pub async fn next(&mut self) -> Option<PolledSnapshot> {
        if self.state().is_terminal() {
            return None;
        }

        let (wake_at, expires) = match (self.next_tick, self.ends_at) {
            (Some(tick), Some(end)) if tick >= end => (Some(end), true),
            (None, Some(end)) => (Some(end), true),
            (tick, _) => (tick, false),
        };
        let cancelled = tokio::select! {
            biased;
            _ = self.cancel_rx.wait_for(|c| *c) => true,
            _ = sleep_until(wake_at) => false,
        };
        if cancelled {
            self.finish(PollState::Stopped);
            return None;
        }
        let Some(tick) = wake_at.filter(|_| !expires) else {
            self.finish(PollState::Completed);
            return None;
        };
        let snapshot = self.source.collect().await;
        let collected_at = Instant::now();

        let counters = snapshot.network.counters;
        let rates = match &self.previous {
            Some((prev, prev_at)) => DerivedRates::between(
                prev.as_ref(),
                counters.as_ref(),
                collected_at.duration_since(*prev_at),
            ),
            None => DerivedRates::default(),
        };
        self.previous = Some((counters, collected_at));
        self.sequence += 1;
        self.next_tick = self.schedule_after(tick);

        Some(PolledSnapshot {
            sequence: self.sequence,
            snapshot,
            rates,
        })
    }

    /// `tick + interval`, or the first later boundary still in the future when the cycle
    /// overran. `None` when that boundary can't be represented.
    fn schedule_after(&self, tick: Instant) -> Option<Instant> {
        let next = tick.checked_add(self.interval)?;
        let now = Instant::now();
        if next >= now {
            return Some(next);
        }
        let behind = now.duration_since(tick);
        let missed = (behind.as_nanos() / self.interval.as_nanos()).min(u32::MAX as u128 - 1) as u32;
        tracing::debug!(
            missed_ticks = missed,
            "collection overran the interval; skipping to next boundary"
        );
        tick.checked_add(self.interval.checked_mul(missed + 1)?)
    }

    fn finish(&mut self, state: PollState) {
        self.state_tx.send_replace(state);
        tracing::debug!(state = ?state, snapshots = self.sequence, "polling session ended");
    }

    /// The session as a `Stream`; ends when the session stops or completes.
    pub fn into_stream(self) -> impl Stream<Item = PolledSnapshot> {
        futures_util::stream::unfold(self, |mut session| async move {
            let item = session.next().await?;
            Some((item, session))
        })
    }
}

/// Sleeps until `at`, or forever when there is no deadline.
async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl<S> Drop for PollingSession<S> {
    fn drop(&mut self) {
        if !self.state_tx.borrow().is_terminal() {
            self.state_tx.send_replace(PollState::Stopped);
        }
    }
}
