use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::api::errors::ApiError;
use crate::domain::event::{Event, EventQuery};

/// Request body for journaling an event
#[derive(Debug, Deserialize)]
pub struct LogEventRequest {
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

/// Query the journal
///
/// GET /api/events?agent=&action=&since=&last=
pub async fn query_events(
    State(coordinator): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(coordinator.query_events(&query).await?))
}

/// POST /api/events
pub async fn log_event(
    State(coordinator): State<AppState>,
    Json(req): Json<LogEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = coordinator
        .log_event(&req.agent, &req.action, req.data)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}
