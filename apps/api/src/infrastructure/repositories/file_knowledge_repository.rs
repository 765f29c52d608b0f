use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::atomic_file::write_atomically;
use crate::domain::knowledge::Topic;
use crate::domain::repositories::{KnowledgeRepository, StoreError};

pub const KNOWLEDGE_DIR: &str = "knowledge";
const NOTE_EXTENSION: &str = "md";

/// Directory-backed implementation of KnowledgeRepository
///
/// Each topic is one `<topic>.md` file, replaced whole on every write.
#[derive(Debug, Clone)]
pub struct FileKnowledgeRepository {
    dir: PathBuf,
}

impl FileKnowledgeRepository {
    /// Opens the knowledge directory under the data directory, creating it if needed
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let dir = data_dir.join(KNOWLEDGE_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, topic: &Topic) -> PathBuf {
        self.dir
            .join(format!("{}.{}", topic.as_str(), NOTE_EXTENSION))
    }
}

#[async_trait]
impl KnowledgeRepository for FileKnowledgeRepository {
    async fn write(&self, topic: &Topic, document: &str) -> Result<(), StoreError> {
        write_atomically(&self.path_for(topic), document).await
    }

    async fn read(&self, topic: &Topic) -> Result<Option<String>, StoreError> {
        let path = self.path_for(topic);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn delete(&self, topic: &Topic) -> Result<bool, StoreError> {
        let path = self.path_for(topic);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut topics = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(NOTE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                topics.push(stem.to_string());
            }
        }

        Ok(topics)
    }
}
