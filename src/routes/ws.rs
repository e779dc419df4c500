// WebSocket handlers and stream logic

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::collectors;
use crate::models::PolledSnapshot;
use crate::probe::PlatformProbe;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_system connection count on drop (connect = +1, drop = -1).
struct WsSystemGuard(Arc<AtomicUsize>);

impl Drop for WsSystemGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// First ping one period after connect, not immediately.
fn new_ping_interval() -> tokio::time::Interval {
    tokio::time::interval_at(tokio::time::Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL)
}

/// False when the client is gone or too slow to take the message.
async fn send(socket: &mut WebSocket, msg: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(msg)).await, Ok(Ok(())))
}

pub(super) async fn ws_cpu(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let probe = state.aggregator.probe().clone();
    let interval_ms = state.config.publishing.cpu_stats_frequency_ms;
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_cpu(socket, probe, interval_ms).await {
            tracing::info!("CPU stream error: {}", e);
        }
    })
}

async fn stream_cpu(
    mut socket: WebSocket,
    probe: Arc<dyn PlatformProbe>,
    interval_ms: u64,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to CPU stream");
    let mut tick = tokio::time::interval(Duration::from_millis(interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ping_interval = new_ping_interval();
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let probe = probe.clone();
                let (cpu, _) =
                    tokio::task::spawn_blocking(move || collectors::cpu::collect(probe.as_ref())).await?;
                let json = serde_json::to_string(&cpu)?;
                if !send(&mut socket, Message::Text(json.into())).await {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if !send(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

pub(super) async fn ws_system(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.stats_tx.clone();
    let conn_count = state.ws_system_connections.clone();
    let probe = state.aggregator.probe().clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) = stream_system(socket, &mut rx, conn_count, probe).await {
            tracing::info!("System stream error: {}", e);
        }
    })
}

async fn stream_system(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<PolledSnapshot>,
    conn_count: Arc<AtomicUsize>,
    probe: Arc<dyn PlatformProbe>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsSystemGuard(conn_count);
    tracing::info!("Client connected to System stream");

    // Identity is static enough to send once instead of with every snapshot
    let (identity, _) =
        tokio::task::spawn_blocking(move || collectors::system::collect(probe.as_ref())).await?;
    let welcome = serde_json::json!({ "type": "info", "system": identity });
    if !send(&mut socket, Message::Text(serde_json::to_string(&welcome)?.into())).await {
        return Ok(());
    }

    let mut ping_interval = new_ping_interval();
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(polled) => {
                        let json = serde_json::to_string(&polled)?;
                        if !send(&mut socket, Message::Text(json.into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/system client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                if !send(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
