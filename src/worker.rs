// Background feed worker: runs one polling session and broadcasts every snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{Duration, Instant, interval};

use crate::aggregator::SnapshotSource;
use crate::models::PolledSnapshot;
use crate::poller::{PollConfig, PollState, PollingSession};

/// Rate limit for "no receivers" message (avoid logging every tick when no one is on /ws/system)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Source, channel, counters and shutdown for the worker.
pub struct WorkerDeps<S> {
    pub source: S,
    pub tx: broadcast::Sender<PolledSnapshot>,
    pub ws_system_connections: Arc<AtomicUsize>,
    pub snapshots_published_total: Arc<AtomicU64>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub poll: PollConfig,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

impl WorkerConfig {
    /// Never shorter than one second; `0` would make the tick panic.
    pub fn stats_log_interval(&self) -> Duration {
        Duration::from_secs(self.stats_log_interval_secs.max(1))
    }
}

/// Spawns the feed. The task resolves to `Completed` when the configured duration runs
/// out, or `Stopped` once shutdown is signalled (or its sender dropped). A cycle already
/// collecting when shutdown arrives is still published.
pub fn spawn<S>(deps: WorkerDeps<S>, config: WorkerConfig) -> tokio::task::JoinHandle<PollState>
where
    S: SnapshotSource + 'static,
{
    let WorkerDeps {
        source,
        tx,
        ws_system_connections,
        snapshots_published_total,
        shutdown_rx,
    } = deps;
    let stats_log_every = config.stats_log_interval();
    let poll = config.poll;

    let mut session = PollingSession::start(source, poll);
    let handle = session.handle();

    let shutdown_handle = handle.clone();
    let shutdown_task = tokio::spawn(async move {
        let _ = shutdown_rx.await;
        tracing::debug!("Worker shutting down");
        shutdown_handle.cancel();
    });

    let stats_counter = snapshots_published_total.clone();
    let stats_task = tokio::spawn(async move {
        let mut stats_log_tick = interval(stats_log_every);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            stats_log_tick.tick().await;
            tracing::info!(
                ws_system_clients = ws_system_connections.load(Ordering::Relaxed),
                snapshots_published_total = stats_counter.load(Ordering::Relaxed),
                "app stats"
            );
        }
    });

    tokio::spawn(async move {
        let mut last_no_receivers_warn: Option<Instant> = None;

        while let Some(polled) = session.next().await {
            snapshots_published_total.fetch_add(1, Ordering::Relaxed);
            for failure in &polled.snapshot.errors {
                tracing::trace!(sequence = polled.sequence, error = %failure, "partial snapshot");
            }
            if tx.send(polled).is_err() {
                let should_warn = last_no_receivers_warn
                    .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                if should_warn {
                    tracing::debug!(
                        operation = "broadcast_snapshot",
                        "No active WebSocket clients; broadcast channel has no receivers"
                    );
                    last_no_receivers_warn = Some(Instant::now());
                }
            }
        }

        stats_task.abort();
        shutdown_task.abort();
        let state = handle.state();
        tracing::info!(
            state = ?state,
            snapshots = session.emitted(),
            "feed worker finished"
        );
        state
    })
}
