use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agents whose last heartbeat is older than this are reported stale
pub const STALE_AFTER_MS: i64 = 300_000;

/// Agent type recorded when registration does not name one
pub const DEFAULT_AGENT_TYPE: &str = "general";

/// Registration status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
}

/// Input for registering an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    #[serde(default, rename = "type")]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// A registered worker process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(rename = "type")]
    pub agent_type: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Agent {
    pub fn new(id: &str, draft: NewAgent, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            agent_type: draft
                .agent_type
                .unwrap_or_else(|| DEFAULT_AGENT_TYPE.to_string()),
            status: AgentStatus::Active,
            capabilities: draft.capabilities,
            registered_at: now,
            last_seen: now,
        }
    }

    /// Records a heartbeat
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
        self.status = AgentStatus::Active;
    }

    /// Stale once more than [`STALE_AFTER_MS`] have passed since the last heartbeat
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_seen).num_milliseconds() > STALE_AFTER_MS
    }
}

/// An agent as reported to observers, with its derived liveness flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub stale: bool,
}

impl AgentView {
    pub fn at(agent: &Agent, now: DateTime<Utc>) -> Self {
        Self {
            stale: agent.is_stale_at(now),
            agent: agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_agent_defaults_to_general_type() {
        let agent = Agent::new("a1", NewAgent::default(), Utc::now());

        assert_eq!(agent.agent_type, "general");
        assert_eq!(agent.status, AgentStatus::Active);
        assert!(agent.capabilities.is_empty());
        assert_eq!(agent.registered_at, agent.last_seen);
    }

    #[test]
    fn fresh_agent_is_not_stale() {
        let now = Utc::now();
        let agent = Agent::new("a1", NewAgent::default(), now);
        assert!(!agent.is_stale_at(now + Duration::milliseconds(STALE_AFTER_MS)));
    }

    #[test]
    fn agent_goes_stale_after_threshold() {
        let now = Utc::now();
        let agent = Agent::new("a1", NewAgent::default(), now);
        assert!(agent.is_stale_at(now + Duration::milliseconds(STALE_AFTER_MS + 1)));
    }

    #[test]
    fn touch_refreshes_liveness() {
        let start = Utc::now() - Duration::minutes(10);
        let mut agent = Agent::new("a1", NewAgent::default(), start);
        let now = Utc::now();
        assert!(agent.is_stale_at(now));

        agent.touch(now);
        assert!(!agent.is_stale_at(now));
        assert_eq!(agent.registered_at, start);
    }

    #[test]
    fn type_field_uses_reserved_name_on_the_wire() {
        let agent = Agent::new(
            "a1",
            NewAgent {
                agent_type: Some("reviewer".to_string()),
                capabilities: vec!["rust".to_string()],
            },
            Utc::now(),
        );
        let value = serde_json::to_value(AgentView::at(&agent, Utc::now())).unwrap();

        assert_eq!(value["type"], "reviewer");
        assert_eq!(value["capabilities"][0], "rust");
        assert_eq!(value["stale"], false);
        assert!(value.get("lastSeen").is_some());
    }
}
