use thiserror::Error;

use crate::domain::repositories::StoreError;

/// Errors raised by coordination operations
///
/// Contention and absence outcomes (a denied lock, a missing note, no
/// pending task) are ordinary return values and never appear here.
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("Workstream already exists: {0}")]
    AlreadyExists(String),

    #[error("Workstream not found: {0}")]
    WorkstreamNotFound(String),

    #[error("Task {task_id} not found in workstream {workstream}")]
    TaskNotFound { workstream: String, task_id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinationError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoordinationError::WorkstreamNotFound(_) | CoordinationError::TaskNotFound { .. }
        )
    }
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Rejects empty or whitespace-only identifiers
pub(crate) fn require_non_empty(field: &str, value: &str) -> CoordinationResult<()> {
    if value.trim().is_empty() {
        return Err(CoordinationError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}
