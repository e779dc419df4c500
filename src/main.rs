use anyhow::Result;
use hostscope::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{}", version::banner());
    let app_config = config::AppConfig::load()?;
    let poll = app_config.poll_config()?;
    let collector_config = app_config.collector_config();

    // Loading every sysinfo table blocks for a moment
    let probe = Arc::new(tokio::task::spawn_blocking(probe::SysinfoProbe::new).await?);
    let aggregator = aggregator::Aggregator::new(probe.clone(), collector_config);

    let (tx, _) =
        broadcast::channel::<models::PolledSnapshot>(app_config.publishing.broadcast_capacity);
    let ws_system_connections = Arc::new(AtomicUsize::new(0));
    let snapshots_published_total = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            source: aggregator.clone(),
            tx: tx.clone(),
            ws_system_connections: ws_system_connections.clone(),
            snapshots_published_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            poll,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(
        tx,
        aggregator,
        probe,
        ws_system_connections,
        app_config.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        interval_ms = app_config.polling.interval_ms,
        process_cpu = ?collector_config.process_cpu,
        "Listening on http://{}",
        addr
    );

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            match worker_handle.await {
                Ok(state) => tracing::info!(state = ?state, "feed worker stopped"),
                Err(e) => tracing::warn!(error = %e, "feed worker task failed"),
            }
        }
    }

    Ok(())
}
