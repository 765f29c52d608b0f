use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::{agents, events, knowledge, locks, status, workstreams};
use crate::coordination::Coordinator;

/// Builds the HTTP surface over a shared coordinator.
///
/// Tracing and CORS layers are added by the server binary.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(status::health_check))
        // Status routes
        .route("/api/status", get(status::status))
        .route("/api/status/text", get(status::status_text))
        // Workstream and task routes
        .route(
            "/api/workstreams",
            get(workstreams::list_workstreams).post(workstreams::create_workstream),
        )
        .route(
            "/api/workstreams/:name/tasks",
            get(workstreams::list_tasks).post(workstreams::add_task),
        )
        .route(
            "/api/workstreams/:name/tasks/:id/claim",
            post(workstreams::claim_task),
        )
        .route(
            "/api/workstreams/:name/tasks/:id/complete",
            post(workstreams::complete_task),
        )
        .route("/api/workstreams/:name/next", post(workstreams::next_task))
        // Agent routes
        .route(
            "/api/agents",
            get(agents::list_agents).post(agents::register_agent),
        )
        .route("/api/agents/:id/heartbeat", post(agents::heartbeat))
        // Journal routes
        .route(
            "/api/events",
            get(events::query_events).post(events::log_event),
        )
        // Knowledge routes
        .route("/api/knowledge", get(knowledge::list_topics))
        .route(
            "/api/knowledge/:topic",
            get(knowledge::read_note)
                .put(knowledge::write_note)
                .delete(knowledge::delete_note),
        )
        // Lock routes
        .route("/api/locks", get(locks::list_locks).post(locks::acquire_lock))
        .route("/api/locks/prune", post(locks::prune_locks))
        .route("/api/locks/:resource/release", post(locks::release_lock))
        // Shared state
        .with_state(coordinator)
}
