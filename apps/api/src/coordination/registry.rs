use chrono::{DateTime, Utc};
use serde_json::json;

use super::errors::{require_non_empty, CoordinationResult};
use super::{Coordinator, Mutation};
use crate::domain::agent::{Agent, AgentView, NewAgent};
use crate::domain::event::{actions, Event};
use crate::domain::state::StateDocument;

pub(crate) fn agent_views(doc: &StateDocument, now: DateTime<Utc>) -> Vec<AgentView> {
    doc.agents
        .values()
        .map(|agent| AgentView::at(agent, now))
        .collect()
}

impl Coordinator {
    /// Registers an agent, replacing any earlier record under the same id
    pub async fn register_agent(&self, id: &str, draft: NewAgent) -> CoordinationResult<Agent> {
        require_non_empty("Agent id", id)?;

        let agent = self
            .mutate(|doc, now| {
                let agent = Agent::new(id, draft.clone(), now);
                doc.agents.insert(id.to_string(), agent.clone());

                Ok(Mutation::Commit {
                    event: Event::at(
                        now,
                        id,
                        actions::AGENT_REGISTERED,
                        json!({ "type": agent.agent_type, "capabilities": agent.capabilities }),
                    ),
                    value: agent,
                })
            })
            .await?;

        tracing::info!(agent = id, agent_type = %agent.agent_type, "Agent registered");
        Ok(agent)
    }

    /// Refreshes an agent's `last_seen`.
    ///
    /// Returns `false` and changes nothing if the agent was never registered.
    /// Heartbeats are not journaled.
    pub async fn heartbeat(&self, id: &str) -> CoordinationResult<bool> {
        let found = self
            .mutate(|doc, now| match doc.agents.get_mut(id) {
                Some(agent) => {
                    agent.touch(now);
                    Ok(Mutation::Quiet(true))
                }
                None => Ok(Mutation::Unchanged(false)),
            })
            .await?;

        if !found {
            tracing::debug!(agent = id, "Heartbeat from unregistered agent ignored");
        }
        Ok(found)
    }

    /// All registered agents with their staleness at the time of the call
    pub async fn list_agents(&self) -> CoordinationResult<Vec<AgentView>> {
        let doc = self.store.load().await?;
        Ok(agent_views(&doc, Utc::now()))
    }
}
