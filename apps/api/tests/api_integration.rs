//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows including:
//! - Workstream and task lifecycle over HTTP
//! - Lock contention surfacing as 409
//! - Knowledge notes and the event journal
//! - Error status mapping for missing and malformed input

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crewboard::api;
use crewboard::coordination::Coordinator;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for oneshot

/// Setup test application over a fresh data directory
async fn setup_app() -> (TempDir, Router) {
    let temp_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::open(temp_dir.path()).await.unwrap();
    (temp_dir, api::router(Arc::new(coordinator)))
}

async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body).await;
    // Extractor rejections answer in plain text
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_workstream(app: &Router, name: &str) {
    let (status, _) = send(app, "POST", "/api/workstreams", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let (_temp, app) = setup_app().await;

    let (status, body) = send_raw(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_create_workstream_and_conflict() {
    let (_temp, app) = setup_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/workstreams",
        Some(json!({ "name": "backend", "priority": 2, "description": "API work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "backend");
    assert_eq!(json["priority"], 2);
    assert_eq!(json["taskCount"], 0);

    let (status, json) = send(&app, "POST", "/api/workstreams", Some(json!({ "name": "backend" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("backend"));

    let (status, json) = send(&app, "GET", "/api/workstreams", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let (_temp, app) = setup_app().await;
    create_workstream(&app, "w").await;

    let (status, task) = send(
        &app,
        "POST",
        "/api/workstreams/w/tasks",
        Some(json!({ "title": "Write docs", "priority": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "pending");
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 8);

    let claim_uri = format!("/api/workstreams/w/tasks/{}/claim", id);
    let (status, claimed) = send(&app, "POST", &claim_uri, Some(json!({ "agent": "a1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["status"], "in_progress");
    assert_eq!(claimed["assignedTo"], "a1");

    let (status, _) = send(&app, "POST", &claim_uri, Some(json!({ "agent": "a2" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let complete_uri = format!("/api/workstreams/w/tasks/{}/complete", id);
    let (status, done) = send(&app, "POST", &complete_uri, Some(json!({ "result": "R" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "done");
    assert_eq!(done["result"], "R");

    let (status, tasks) = send(&app, "GET", "/api/workstreams/w/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks[0]["status"], "done");
}

#[tokio::test]
async fn test_next_task() {
    let (_temp, app) = setup_app().await;
    create_workstream(&app, "w").await;
    for (title, priority) in [("later", 3), ("urgent", 1)] {
        send(
            &app,
            "POST",
            "/api/workstreams/w/tasks",
            Some(json!({ "title": title, "priority": priority })),
        )
        .await;
    }

    let (status, json) = send(&app, "POST", "/api/workstreams/w/next", Some(json!({ "agent": "a1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["task"]["title"], "urgent");
    assert_eq!(json["task"]["assignedTo"], "a1");

    send(&app, "POST", "/api/workstreams/w/next", Some(json!({ "agent": "a1" }))).await;
    let (status, json) = send(&app, "POST", "/api/workstreams/w/next", Some(json!({ "agent": "a1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["task"].is_null());
}

#[tokio::test]
async fn test_missing_workstream_is_404() {
    let (_temp, app) = setup_app().await;

    let (status, json) = send(&app, "GET", "/api/workstreams/nope/tasks", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/workstreams/nope/tasks",
        Some(json!({ "title": "T" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_input_is_client_error() {
    let (_temp, app) = setup_app().await;
    create_workstream(&app, "w").await;

    let (status, _) = send(&app, "POST", "/api/workstreams", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/workstreams/w/tasks", Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_raw(&app, "POST", "/api/workstreams/w/tasks", Some(json!({ "priority": 1 }))).await;
    assert!(status.is_client_error());
    assert!(!body.is_empty());

    let (status, _) = send(&app, "POST", "/api/workstreams/w/tasks", Some(json!({ "priority": 1 }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_agent_registration_and_heartbeat() {
    let (_temp, app) = setup_app().await;

    let (status, agent) = send(
        &app,
        "POST",
        "/api/agents",
        Some(json!({ "id": "a1", "type": "coder", "capabilities": ["rust"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(agent["type"], "coder");
    assert_eq!(agent["status"], "active");

    let (_, json) = send(&app, "POST", "/api/agents/a1/heartbeat", None).await;
    assert_eq!(json["found"], true);
    let (_, json) = send(&app, "POST", "/api/agents/ghost/heartbeat", None).await;
    assert_eq!(json["found"], false);

    let (status, agents) = send(&app, "GET", "/api/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents[0]["id"], "a1");
    assert_eq!(agents[0]["stale"], false);
}

#[tokio::test]
async fn test_lock_contention() {
    let (_temp, app) = setup_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/locks",
        Some(json!({ "resource": "repo", "agent": "a1", "ttlMs": 60000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["acquired"], true);

    let (status, json) = send(
        &app,
        "POST",
        "/api/locks",
        Some(json!({ "resource": "repo", "agent": "a2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["acquired"], false);
    assert_eq!(json["lock"]["agent"], "a1");

    let (_, json) = send(&app, "POST", "/api/locks/repo/release", Some(json!({ "agent": "a2" }))).await;
    assert_eq!(json["released"], false);
    let (_, json) = send(&app, "POST", "/api/locks/repo/release", Some(json!({ "agent": "a1" }))).await;
    assert_eq!(json["released"], true);

    let (status, locks) = send(&app, "GET", "/api/locks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(locks.as_array().unwrap().is_empty());

    let (status, json) = send(&app, "POST", "/api/locks/prune", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["pruned"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_knowledge_notes() {
    let (_temp, app) = setup_app().await;

    let (status, note) = send(
        &app,
        "PUT",
        "/api/knowledge/design",
        Some(json!({ "agent": "a1", "content": "use flat files" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["topic"], "design");

    let (status, note) = send(&app, "GET", "/api/knowledge/design", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(note["content"].as_str().unwrap().contains("use flat files"));

    let (status, topics) = send(&app, "GET", "/api/knowledge", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topics, json!(["design"]));

    let (_, json) = send(&app, "DELETE", "/api/knowledge/design?agent=a1", None).await;
    assert_eq!(json["deleted"], true);

    let (status, _) = send(&app, "GET", "/api/knowledge/design", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_log_and_query() {
    let (_temp, app) = setup_app().await;

    let (status, event) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "agent": "a1", "action": "act", "data": { "k": "v" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["k"], "v");

    send(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "agent": "a2", "action": "act" })),
    )
    .await;

    let (status, events) = send(&app, "GET", "/api/events?agent=a1&action=act", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["k"], "v");

    let (_, events) = send(&app, "GET", "/api/events?last=1", None).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["agent"], "a2");
}

#[tokio::test]
async fn test_status_views() {
    let (_temp, app) = setup_app().await;
    create_workstream(&app, "w").await;

    let (status, snapshot) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["version"], 1);
    assert_eq!(snapshot["workstreams"][0]["name"], "w");
    assert_eq!(snapshot["recentEvents"][0]["action"], "workstream_created");

    let (status, text) = send_raw(&app, "GET", "/api/status/text", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(text).unwrap();
    assert!(text.contains("Workstreams (1):"));
}
