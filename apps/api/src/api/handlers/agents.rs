use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::api::errors::ApiError;
use crate::domain::agent::{Agent, AgentView, NewAgent};

/// Request body for registering an agent
#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub id: String,
    #[serde(flatten)]
    pub agent: NewAgent,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub found: bool,
}

/// GET /api/agents
pub async fn list_agents(
    State(coordinator): State<AppState>,
) -> Result<Json<Vec<AgentView>>, ApiError> {
    Ok(Json(coordinator.list_agents().await?))
}

/// Register (or re-register) an agent
///
/// POST /api/agents
pub async fn register_agent(
    State(coordinator): State<AppState>,
    Json(req): Json<RegisterAgentRequest>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    let agent = coordinator.register_agent(&req.id, req.agent).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// POST /api/agents/:id/heartbeat
pub async fn heartbeat(
    State(coordinator): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let found = coordinator.heartbeat(&id).await?;
    Ok(Json(HeartbeatResponse { found }))
}
