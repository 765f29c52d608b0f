use async_trait::async_trait;

use super::state_store::StoreError;
use crate::domain::knowledge::Topic;

/// Repository trait for knowledge notes
///
/// A topic exists exactly when a document is stored under it.
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Store `document` under `topic`, replacing any previous one
    async fn write(&self, topic: &Topic, document: &str) -> Result<(), StoreError>;

    /// Fetch the stored document, `None` if the topic is unknown
    async fn read(&self, topic: &Topic) -> Result<Option<String>, StoreError>;

    /// Remove the topic; `false` if it did not exist
    async fn delete(&self, topic: &Topic) -> Result<bool, StoreError>;

    /// All known topic names, in no particular order
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
