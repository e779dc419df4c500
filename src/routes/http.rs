// HTTP handlers: version, info, snapshot, process inspection and termination

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::collectors;
use crate::error::{DomainError, ProbeError};
use crate::models::{ProcessCpuMode, SystemIdentity};
use crate::version::{NAME, VERSION};

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: error.into(),
        }),
    )
        .into_response()
}

fn probe_error_response(e: &ProbeError) -> Response {
    match e {
        // A pid that vanished (or never existed) is the common transient case here
        ProbeError::Transient(reason) => error_response(StatusCode::NOT_FOUND, reason.clone()),
        ProbeError::Unavailable(reason) => {
            error_response(StatusCode::NOT_IMPLEMENTED, reason.clone())
        }
    }
}

fn join_error_response(e: tokio::task::JoinError) -> Response {
    tracing::warn!(error = %e, "blocking probe task failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "probe task failed")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub system: SystemIdentity,
    pub error: Option<DomainError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateResponse {
    pub pid: u32,
    pub signalled: bool,
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/info: system identity, collected on request.
pub(super) async fn api_info_handler(State(state): State<AppState>) -> Response {
    let probe = state.aggregator.probe().clone();
    match tokio::task::spawn_blocking(move || collectors::system::collect(probe.as_ref())).await {
        Ok((system, error)) => Json(InfoResponse { system, error }).into_response(),
        Err(e) => join_error_response(e),
    }
}

/// GET /api/snapshot: one aggregated snapshot across every domain.
pub(super) async fn snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.aggregator.collect_concurrent().await)
}

async fn inspect(state: &AppState, pid: u32, mode: ProcessCpuMode) -> Response {
    let probe = state.aggregator.probe().clone();
    match tokio::task::spawn_blocking(move || {
        collectors::process::inspect(probe.as_ref(), pid, mode)
    })
    .await
    {
        Ok(Ok(record)) => Json(record).into_response(),
        Ok(Err(e)) => probe_error_response(&e),
        Err(e) => join_error_response(e),
    }
}

/// GET /api/processes/{pid}: resource usage of one process, sampled with the configured CPU mode.
pub(super) async fn process_handler(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Response {
    let mode = state.aggregator.config().process_cpu;
    inspect(&state, pid, mode).await
}

/// POST /api/processes/{pid}/terminate: disabled unless `server.allow_process_termination`.
pub(super) async fn terminate_handler(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
) -> Response {
    if !state.config.server.allow_process_termination {
        return error_response(StatusCode::FORBIDDEN, "process termination is disabled");
    }
    let control = state.process_control.clone();
    match tokio::task::spawn_blocking(move || control.terminate_process(pid)).await {
        Ok(Ok(())) => (
            StatusCode::ACCEPTED,
            Json(TerminateResponse {
                pid,
                signalled: true,
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            tracing::warn!(pid, error = %e, operation = "terminate_process", "terminate failed");
            probe_error_response(&e)
        }
        Err(e) => join_error_response(e),
    }
}
