// Workstream domain module
// Contains the workstream aggregate, its tasks and their status value objects

#![allow(clippy::module_inception)]

pub mod task;
pub mod value_objects;
pub mod workstream;

// Re-export main types for convenience
pub use task::{NewTask, Task, DEFAULT_TASK_PRIORITY};
pub use value_objects::{TaskStatus, WorkstreamStatus};
pub use workstream::{
    NewWorkstream, TaskCounts, Workstream, WorkstreamSummary, DEFAULT_WORKSTREAM_PRIORITY,
};
