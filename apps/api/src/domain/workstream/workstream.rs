use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{NewTask, Task};
use super::value_objects::{TaskStatus, WorkstreamStatus};

/// Priority given to workstreams created without one (lower = more urgent)
pub const DEFAULT_WORKSTREAM_PRIORITY: i64 = 5;

/// Input for creating a workstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWorkstream {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// Workstream aggregate: a named, prioritized bucket of tasks
///
/// The name is the key under which the workstream is stored and is not
/// repeated inside the record.
///
/// # Invariants
/// - Tasks keep their creation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workstream {
    #[serde(default)]
    pub description: String,
    pub priority: i64,
    #[serde(default)]
    pub status: WorkstreamStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
}

impl Workstream {
    pub fn new(draft: NewWorkstream, now: DateTime<Utc>) -> Self {
        Self {
            description: draft.description.unwrap_or_default(),
            priority: draft.priority.unwrap_or(DEFAULT_WORKSTREAM_PRIORITY),
            status: WorkstreamStatus::Active,
            tasks: Vec::new(),
            created_at: now,
        }
    }

    /// Appends a new pending task and returns a copy of it
    pub fn add_task(&mut self, draft: NewTask, now: DateTime<Utc>) -> Result<Task, String> {
        let task = Task::new(draft, now)?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Picks the pending task with the lowest priority value.
    ///
    /// Ties go to the task created first.
    pub fn next_pending(&self) -> Option<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_pending())
            .fold(None, |best: Option<&Task>, t| match best {
                Some(b) if b.priority <= t.priority => Some(b),
                _ => Some(t),
            })
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts {
            task_count: self.tasks.len(),
            ..TaskCounts::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }
}

/// Derived task counts of a workstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub task_count: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

/// A workstream as listed: the stored record plus its name and derived counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkstreamSummary {
    pub name: String,
    #[serde(flatten)]
    pub workstream: Workstream,
    #[serde(flatten)]
    pub counts: TaskCounts,
}

impl WorkstreamSummary {
    pub fn new(name: &str, workstream: &Workstream) -> Self {
        Self {
            name: name.to_string(),
            counts: workstream.counts(),
            workstream: workstream.clone(),
        }
    }
}
