// Domain layer module exports
// Data model of the shared coordination board. Independent of storage and
// transport concerns.

pub mod agent;
pub mod event;
pub mod ids;
pub mod knowledge;
pub mod lock;
pub mod repositories;
pub mod state;
pub mod workstream;

pub use agent::{Agent, AgentStatus, AgentView, NewAgent};
pub use event::{Event, EventQuery, SYSTEM_AGENT};
pub use knowledge::Topic;
pub use lock::{AcquireOutcome, Lock, LockView, DEFAULT_LOCK_TTL_MS};
pub use state::StateDocument;
pub use workstream::{NewTask, NewWorkstream, Task, TaskStatus, Workstream, WorkstreamSummary};
