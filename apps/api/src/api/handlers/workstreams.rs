use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AgentRequest, AppState};
use crate::api::errors::ApiError;
use crate::domain::workstream::{NewTask, NewWorkstream, Task, WorkstreamSummary};

/// Request body for creating a workstream
#[derive(Debug, Deserialize)]
pub struct CreateWorkstreamRequest {
    pub name: String,
    #[serde(flatten)]
    pub workstream: NewWorkstream,
}

/// Request body for completing a task
#[derive(Debug, Deserialize)]
pub struct CompleteTaskRequest {
    #[serde(default)]
    pub result: Option<Value>,
}

/// Response from get-next-task; `task` is null when nothing is pending
#[derive(Debug, Serialize)]
pub struct NextTaskResponse {
    pub task: Option<Task>,
}

/// List workstreams, most urgent first
///
/// GET /api/workstreams
pub async fn list_workstreams(
    State(coordinator): State<AppState>,
) -> Result<Json<Vec<WorkstreamSummary>>, ApiError> {
    Ok(Json(coordinator.list_workstreams().await?))
}

/// Create a workstream
///
/// POST /api/workstreams
pub async fn create_workstream(
    State(coordinator): State<AppState>,
    Json(req): Json<CreateWorkstreamRequest>,
) -> Result<(StatusCode, Json<WorkstreamSummary>), ApiError> {
    let workstream = coordinator
        .create_workstream(&req.name, req.workstream)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WorkstreamSummary::new(&req.name, &workstream)),
    ))
}

/// GET /api/workstreams/:name/tasks
pub async fn list_tasks(
    State(coordinator): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(coordinator.list_tasks(&name).await?))
}

/// POST /api/workstreams/:name/tasks
pub async fn add_task(
    State(coordinator): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = coordinator.add_task(&name, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// POST /api/workstreams/:name/tasks/:id/claim
pub async fn claim_task(
    State(coordinator): State<AppState>,
    Path((name, task_id)): Path<(String, String)>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(
        coordinator.claim_task(&name, &task_id, &req.agent).await?,
    ))
}

/// Complete a task; the body is optional
///
/// POST /api/workstreams/:name/tasks/:id/complete
pub async fn complete_task(
    State(coordinator): State<AppState>,
    Path((name, task_id)): Path<(String, String)>,
    req: Option<Json<CompleteTaskRequest>>,
) -> Result<Json<Task>, ApiError> {
    let result = req.and_then(|Json(req)| req.result);
    Ok(Json(
        coordinator.complete_task(&name, &task_id, result).await?,
    ))
}

/// Pick and claim the most urgent pending task
///
/// POST /api/workstreams/:name/next
pub async fn next_task(
    State(coordinator): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<NextTaskResponse>, ApiError> {
    let task = coordinator.next_task(&name, &req.agent).await?;
    Ok(Json(NextTaskResponse { task }))
}
