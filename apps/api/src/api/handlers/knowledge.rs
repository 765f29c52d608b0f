use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::api::errors::ApiError;
use crate::coordination::KnowledgeNote;

/// Request body for writing a note
#[derive(Debug, Deserialize)]
pub struct WriteKnowledgeRequest {
    pub agent: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteKnowledgeParams {
    pub agent: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteKnowledgeResponse {
    pub deleted: bool,
}

/// GET /api/knowledge
pub async fn list_topics(State(coordinator): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let mut topics = coordinator.list_knowledge().await?;
    topics.sort();
    Ok(Json(topics))
}

/// GET /api/knowledge/:topic
pub async fn read_note(
    State(coordinator): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<KnowledgeNote>, ApiError> {
    coordinator
        .read_knowledge(&topic)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Knowledge topic not found: {}", topic)))
}

/// Write (overwrite) a note
///
/// PUT /api/knowledge/:topic
pub async fn write_note(
    State(coordinator): State<AppState>,
    Path(topic): Path<String>,
    Json(req): Json<WriteKnowledgeRequest>,
) -> Result<Json<KnowledgeNote>, ApiError> {
    Ok(Json(
        coordinator
            .write_knowledge(&topic, &req.content, &req.agent)
            .await?,
    ))
}

/// DELETE /api/knowledge/:topic?agent=
pub async fn delete_note(
    State(coordinator): State<AppState>,
    Path(topic): Path<String>,
    Query(params): Query<DeleteKnowledgeParams>,
) -> Result<Json<DeleteKnowledgeResponse>, ApiError> {
    let deleted = coordinator.delete_knowledge(&topic, &params.agent).await?;
    Ok(Json(DeleteKnowledgeResponse { deleted }))
}
