// HTTP handlers, one file per area of the board. Each handler is a thin
// adapter over a single Coordinator operation.

pub mod agents;
pub mod events;
pub mod knowledge;
pub mod locks;
pub mod status;
pub mod workstreams;

use serde::Deserialize;
use std::sync::Arc;

use crate::coordination::Coordinator;

/// Shared handler state
pub type AppState = Arc<Coordinator>;

/// Request body naming the acting agent
#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub agent: String,
}
