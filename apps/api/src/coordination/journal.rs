use serde_json::Value;

use super::errors::{require_non_empty, CoordinationResult};
use super::Coordinator;
use crate::domain::event::{Event, EventQuery};

impl Coordinator {
    /// Journals an arbitrary event on behalf of an agent
    pub async fn log_event(
        &self,
        agent_id: &str,
        action: &str,
        data: Value,
    ) -> CoordinationResult<Event> {
        require_non_empty("Agent id", agent_id)?;
        require_non_empty("Action", action)?;

        let event = Event::new(agent_id, action, data);
        self.append_journal(&event).await?;
        tracing::debug!(agent = agent_id, action, "Event logged");
        Ok(event)
    }

    /// Scans the whole journal and returns the matching records in order
    pub async fn query_events(&self, query: &EventQuery) -> CoordinationResult<Vec<Event>> {
        let events = self.store.read_events().await?;
        Ok(query.apply(events))
    }
}
