use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{AgentRequest, AppState};
use crate::api::errors::ApiError;
use crate::domain::lock::{AcquireOutcome, LockView};

/// Request body for acquiring a lock
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquireLockRequest {
    pub resource: String,
    pub agent: String,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

/// Acquire outcome. On conflict `lock` describes the current holder.
#[derive(Debug, Serialize)]
pub struct AcquireLockResponse {
    pub acquired: bool,
    pub lock: LockView,
}

#[derive(Debug, Serialize)]
pub struct ReleaseLockResponse {
    pub released: bool,
}

#[derive(Debug, Serialize)]
pub struct PruneLocksResponse {
    pub pruned: Vec<String>,
}

/// GET /api/locks
pub async fn list_locks(
    State(coordinator): State<AppState>,
) -> Result<Json<Vec<LockView>>, ApiError> {
    Ok(Json(coordinator.list_locks().await?))
}

/// Acquire or refresh a lease; 409 when another agent holds it
///
/// POST /api/locks
pub async fn acquire_lock(
    State(coordinator): State<AppState>,
    Json(req): Json<AcquireLockRequest>,
) -> Result<(StatusCode, Json<AcquireLockResponse>), ApiError> {
    let outcome = coordinator
        .acquire_lock(&req.resource, &req.agent, req.ttl_ms)
        .await?;

    let (status, acquired, lock) = match outcome {
        AcquireOutcome::Acquired(lock) => (StatusCode::OK, true, lock),
        AcquireOutcome::Held(lock) => (StatusCode::CONFLICT, false, lock),
    };
    Ok((status, Json(AcquireLockResponse { acquired, lock })))
}

/// POST /api/locks/:resource/release
pub async fn release_lock(
    State(coordinator): State<AppState>,
    Path(resource): Path<String>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<ReleaseLockResponse>, ApiError> {
    let released = coordinator.release_lock(&resource, &req.agent).await?;
    Ok(Json(ReleaseLockResponse { released }))
}

/// POST /api/locks/prune
pub async fn prune_locks(
    State(coordinator): State<AppState>,
) -> Result<Json<PruneLocksResponse>, ApiError> {
    let pruned = coordinator.prune_expired_locks().await?;
    Ok(Json(PruneLocksResponse { pruned }))
}
