use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Agent name recorded on events not attributable to a specific agent
pub const SYSTEM_AGENT: &str = "system";

/// Actions journaled by the engine itself
pub mod actions {
    pub const WORKSTREAM_CREATED: &str = "workstream_created";
    pub const TASK_CREATED: &str = "task_created";
    pub const TASK_CLAIMED: &str = "task_claimed";
    pub const TASK_COMPLETED: &str = "task_completed";
    pub const AGENT_REGISTERED: &str = "agent_registered";
    pub const LOCK_ACQUIRED: &str = "lock_acquired";
    pub const LOCK_RELEASED: &str = "lock_released";
    pub const LOCKS_PRUNED: &str = "locks_pruned";
    pub const KNOWLEDGE_WRITTEN: &str = "knowledge_written";
    pub const KNOWLEDGE_DELETED: &str = "knowledge_deleted";
}

const ENVELOPE_FIELDS: [&str; 3] = ["ts", "agent", "action"];

/// One journal record: a fixed envelope plus an action-specific payload
///
/// The payload is flattened next to the envelope when serialized, so each
/// journal line is a single flat JSON object.
///
/// # Example
/// ```
/// use crewboard::domain::Event;
/// use serde_json::json;
///
/// let event = Event::new("a1", "deployed", json!({"env": "staging"}));
/// let line = serde_json::to_value(&event).unwrap();
/// assert_eq!(line["env"], "staging");
/// assert_eq!(line["action"], "deployed");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub agent: String,
    pub action: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Event {
    /// Creates an event stamped with the current time
    pub fn new(agent: impl Into<String>, action: impl Into<String>, data: Value) -> Self {
        Self::at(Utc::now(), agent, action, data)
    }

    /// Creates an event with an explicit timestamp.
    ///
    /// Non-object payloads are stored under a `value` key. Payload keys that
    /// collide with the envelope are dropped.
    pub fn at(
        ts: DateTime<Utc>,
        agent: impl Into<String>,
        action: impl Into<String>,
        data: Value,
    ) -> Self {
        let mut data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        for key in ENVELOPE_FIELDS {
            data.remove(key);
        }

        Self {
            ts,
            agent: agent.into(),
            action: action.into(),
            data,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Journal filters, applied conjunctively
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last: Option<usize>,
}

impl EventQuery {
    pub fn last(n: usize) -> Self {
        Self {
            last: Some(n),
            ..Self::default()
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.agent.as_deref().map_or(true, |a| event.agent == a)
            && self.action.as_deref().map_or(true, |a| event.action == a)
            && self.since.map_or(true, |since| event.ts >= since)
    }

    /// Filters `events` (in journal order), then keeps only the final `last` matches
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let mut matched: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        if let Some(last) = self.last {
            if matched.len() > last {
                matched = matched.split_off(matched.len() - last);
            }
        }
        matched
    }
}
