use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{require_non_empty, CoordinationError, CoordinationResult};
use super::Coordinator;
use crate::domain::event::{actions, Event};
use crate::domain::knowledge::{compose_document, Topic};

/// A stored note, header line included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeNote {
    pub topic: String,
    pub content: String,
}

fn parse_topic(topic: &str) -> CoordinationResult<Topic> {
    Topic::new(topic).map_err(CoordinationError::Validation)
}

impl Coordinator {
    /// Stores a note under `topic`, replacing any previous one
    ///
    /// Writes are serialized with every other mutation, and the note file is
    /// replaced whole, so readers never see a partial note.
    pub async fn write_knowledge(
        &self,
        topic: &str,
        content: &str,
        agent_id: &str,
    ) -> CoordinationResult<KnowledgeNote> {
        let topic = parse_topic(topic)?;
        require_non_empty("Agent id", agent_id)?;

        let _gate = self.write_gate.lock().await;
        let now = Utc::now();
        let document = compose_document(agent_id, now, content);
        self.knowledge.write(&topic, &document).await?;
        self.store
            .append_event(&Event::at(
                now,
                agent_id,
                actions::KNOWLEDGE_WRITTEN,
                json!({ "topic": topic.as_str(), "bytes": content.len() }),
            ))
            .await?;

        tracing::info!(topic = %topic, agent = agent_id, "Knowledge written");
        Ok(KnowledgeNote {
            topic: topic.into(),
            content: document,
        })
    }

    /// The note stored under `topic`, `None` if there is none
    pub async fn read_knowledge(&self, topic: &str) -> CoordinationResult<Option<KnowledgeNote>> {
        let topic = parse_topic(topic)?;
        let content = self.knowledge.read(&topic).await?;
        Ok(content.map(|content| KnowledgeNote {
            topic: topic.into(),
            content,
        }))
    }

    /// Removes a note; `false` if the topic did not exist
    pub async fn delete_knowledge(&self, topic: &str, agent_id: &str) -> CoordinationResult<bool> {
        let topic = parse_topic(topic)?;
        require_non_empty("Agent id", agent_id)?;

        let _gate = self.write_gate.lock().await;
        let deleted = self.knowledge.delete(&topic).await?;
        if deleted {
            self.store
                .append_event(&Event::new(
                    agent_id,
                    actions::KNOWLEDGE_DELETED,
                    json!({ "topic": topic.as_str() }),
                ))
                .await?;
            tracing::info!(topic = %topic, agent = agent_id, "Knowledge deleted");
        }
        Ok(deleted)
    }

    /// Names of all stored topics, in no particular order
    pub async fn list_knowledge(&self) -> CoordinationResult<Vec<String>> {
        Ok(self.knowledge.list().await?)
    }
}
