use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write;

use super::errors::CoordinationResult;
use super::locks::live_locks;
use super::registry::agent_views;
use super::workstreams::summarize;
use super::Coordinator;
use crate::domain::agent::AgentView;
use crate::domain::event::{Event, EventQuery};
use crate::domain::lock::LockView;
use crate::domain::workstream::WorkstreamSummary;

/// Number of journal records included in a status snapshot
pub const RECENT_EVENT_COUNT: usize = 10;

/// Point-in-time view of the whole board
///
/// Composed from several independent reads, so a mutation landing between
/// them can show up in some sections and not others.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub generated_at: DateTime<Utc>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub workstreams: Vec<WorkstreamSummary>,
    pub agents: Vec<AgentView>,
    pub locks: Vec<LockView>,
    pub recent_events: Vec<Event>,
    pub knowledge_topics: Vec<String>,
}

impl Coordinator {
    pub async fn status(&self) -> CoordinationResult<StatusSnapshot> {
        let doc = self.store.load().await?;
        let now = Utc::now();

        let recent_events = self
            .query_events(&EventQuery::last(RECENT_EVENT_COUNT))
            .await?;
        let mut knowledge_topics = self.list_knowledge().await?;
        knowledge_topics.sort();

        Ok(StatusSnapshot {
            generated_at: now,
            version: doc.version,
            updated_at: doc.updated_at,
            workstreams: summarize(&doc),
            agents: agent_views(&doc, now),
            locks: live_locks(&doc, now),
            recent_events,
            knowledge_topics,
        })
    }
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl StatusSnapshot {
    /// Renders the snapshot as plain text for terminals
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            "crewboard status (version {}, updated {})",
            self.version,
            timestamp(&self.updated_at)
        )?;

        writeln!(out, "\nWorkstreams ({}):", self.workstreams.len())?;
        if self.workstreams.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for ws in &self.workstreams {
            writeln!(
                out,
                "  [p{}] {}: {} tasks, {} pending, {} in progress, {} done",
                ws.workstream.priority,
                ws.name,
                ws.counts.task_count,
                ws.counts.pending,
                ws.counts.in_progress,
                ws.counts.done
            )?;
        }

        writeln!(out, "\nAgents ({}):", self.agents.len())?;
        if self.agents.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for view in &self.agents {
            writeln!(
                out,
                "  {} ({}) last seen {}{}",
                view.agent.id,
                view.agent.agent_type,
                timestamp(&view.agent.last_seen),
                if view.stale { " [stale]" } else { "" }
            )?;
        }

        writeln!(out, "\nLocks ({}):", self.locks.len())?;
        if self.locks.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for lock in &self.locks {
            let remaining = lock
                .expires_at
                .map(|expiry| format!("{}s left", (expiry - self.generated_at).num_seconds()))
                .unwrap_or_else(|| "no expiry".to_string());
            writeln!(out, "  {} held by {} ({})", lock.resource, lock.agent, remaining)?;
        }

        writeln!(out, "\nRecent events:")?;
        if self.recent_events.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for event in &self.recent_events {
            write!(out, "  {} {} {}", timestamp(&event.ts), event.agent, event.action)?;
            if !event.data.is_empty() {
                write!(out, " {}", serde_json::Value::Object(event.data.clone()))?;
            }
            writeln!(out)?;
        }

        writeln!(out, "\nKnowledge topics:")?;
        if self.knowledge_topics.is_empty() {
            writeln!(out, "  (none)")?;
        } else {
            writeln!(out, "  {}", self.knowledge_topics.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::create_test_coordinator;
    use super::*;
    use crate::domain::agent::NewAgent;
    use crate::domain::workstream::{NewTask, NewWorkstream};
    use serde_json::json;

    #[tokio::test]
    async fn empty_board_renders_placeholders() {
        let (_temp, coordinator) = create_test_coordinator().await;
        let snapshot = coordinator.status().await.unwrap();

        assert_eq!(snapshot.version, 0);
        let text = snapshot.render_text();
        assert!(text.starts_with("crewboard status (version 0"));
        assert!(text.contains("Workstreams (0):\n  (none)"));
    }

    #[tokio::test]
    async fn snapshot_composes_every_section() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        coordinator.add_task("w", NewTask::titled("T")).await.unwrap();
        coordinator
            .register_agent("a1", NewAgent::default())
            .await
            .unwrap();
        coordinator.acquire_lock("repo", "a1", None).await.unwrap();
        coordinator.write_knowledge("notes", "hi", "a1").await.unwrap();

        let snapshot = coordinator.status().await.unwrap();
        assert_eq!(snapshot.version, 4);
        assert_eq!(snapshot.workstreams[0].counts.pending, 1);
        assert_eq!(snapshot.agents.len(), 1);
        assert!(!snapshot.agents[0].stale);
        assert_eq!(snapshot.locks[0].resource, "repo");
        assert_eq!(snapshot.knowledge_topics, vec!["notes"]);
        assert_eq!(snapshot.recent_events.len(), 5);

        let text = snapshot.render_text();
        assert!(text.contains("w: 1 tasks, 1 pending"));
        assert!(text.contains("a1 (general)"));
        assert!(text.contains("repo held by a1"));
        assert!(text.contains("notes"));
    }

    #[tokio::test]
    async fn recent_events_are_capped() {
        let (_temp, coordinator) = create_test_coordinator().await;
        for n in 0..(RECENT_EVENT_COUNT + 5) {
            coordinator
                .log_event("a1", "tick", json!({ "n": n }))
                .await
                .unwrap();
        }

        let snapshot = coordinator.status().await.unwrap();
        assert_eq!(snapshot.recent_events.len(), RECENT_EVENT_COUNT);
        assert_eq!(
            snapshot.recent_events.last().unwrap().field("n"),
            Some(&json!(RECENT_EVENT_COUNT + 4))
        );
    }

    #[tokio::test]
    async fn repeated_status_is_stable_without_mutations() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();

        let first = coordinator.status().await.unwrap();
        let second = coordinator.status().await.unwrap();
        assert_eq!(first.version, second.version);
        assert_eq!(first.workstreams, second.workstreams);
        assert_eq!(first.recent_events, second.recent_events);
        assert_eq!(first.knowledge_topics, second.knowledge_topics);
    }
}
