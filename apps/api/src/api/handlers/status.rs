use axum::{extract::State, Json};

use super::AppState;
use crate::api::errors::ApiError;
use crate::coordination::StatusSnapshot;

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/status
pub async fn status(State(coordinator): State<AppState>) -> Result<Json<StatusSnapshot>, ApiError> {
    Ok(Json(coordinator.status().await?))
}

/// Status rendered for terminals
///
/// GET /api/status/text
pub async fn status_text(State(coordinator): State<AppState>) -> Result<String, ApiError> {
    Ok(coordinator.status().await?.render_text())
}
