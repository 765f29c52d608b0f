use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value_objects::TaskStatus;
use crate::domain::ids::generate_task_id;

/// Priority given to tasks created without one (lower = more urgent)
pub const DEFAULT_TASK_PRIORITY: i64 = 5;

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub estimate: Option<String>,
}

impl NewTask {
    /// Convenience constructor for a task with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// A unit of work inside a workstream
///
/// # Invariants
/// - Title is never empty
/// - `assigned_to` is set once the task has been claimed
/// - `updated_at` never precedes `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: i64,
    #[serde(default)]
    pub estimate: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl Task {
    /// Creates a pending task with a freshly generated identifier
    ///
    /// # Returns
    /// * `Err(String)` - If the title is empty
    pub fn new(draft: NewTask, now: DateTime<Utc>) -> Result<Self, String> {
        if draft.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }

        Ok(Self {
            id: generate_task_id(),
            title: draft.title,
            description: draft.description.unwrap_or_default(),
            status: TaskStatus::Pending,
            priority: draft.priority.unwrap_or(DEFAULT_TASK_PRIORITY),
            estimate: draft.estimate,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            result: None,
        })
    }

    /// Claims the task for an agent
    ///
    /// # Business Rules
    /// - Task must be pending
    /// - Records the assignee and bumps `updated_at`
    pub fn claim(&mut self, agent_id: &str, now: DateTime<Utc>) -> Result<(), String> {
        let next_status = TaskStatus::InProgress;
        if !self.status.can_transition_to(next_status) {
            return Err(format!(
                "Task {} is {}, only pending tasks can be claimed",
                self.id, self.status
            ));
        }

        self.status = next_status;
        self.assigned_to = Some(agent_id.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Marks the task done with the given result.
    ///
    /// Completion is accepted from any status, including pending and done.
    pub fn complete(&mut self, result: Option<Value>, now: DateTime<Utc>) {
        self.status = TaskStatus::Done;
        self.result = result;
        self.updated_at = now;
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}
