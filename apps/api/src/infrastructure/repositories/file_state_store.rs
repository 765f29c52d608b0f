use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::atomic_file::write_atomically;
use crate::domain::event::Event;
use crate::domain::repositories::{StateStore, StoreError};
use crate::domain::state::StateDocument;

pub const STATE_FILE: &str = "state.json";
pub const EVENTS_FILE: &str = "events.jsonl";

/// Only the version is needed to detect a conflicting save
#[derive(Deserialize)]
struct VersionProbe {
    version: u64,
}

/// File-backed implementation of StateStore
///
/// Layout under the data directory:
/// - `state.json`: the whole state document, rewritten on every save
/// - `events.jsonl`: the journal, one JSON object per line
///
/// Saves go through a temp file and a rename so readers never observe a
/// partially written document. The version check in [`StateStore::save`]
/// narrows, but does not close, the window in which two processes can both
/// save on top of the same version.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
    state_path: PathBuf,
    events_path: PathBuf,
}

impl FileStateStore {
    /// Opens (and on first use initializes) a store rooted at `root`
    ///
    /// Creates the directory, an empty version-0 document and an empty
    /// journal when they are absent.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root, e))?;

        let store = Self {
            state_path: root.join(STATE_FILE),
            events_path: root.join(EVENTS_FILE),
            root,
        };

        if !store.exists(&store.state_path).await? {
            store
                .write_document(&StateDocument::empty(Utc::now()))
                .await?;
            tracing::info!(path = %store.state_path.display(), "Initialized empty state document");
        }

        if !store.exists(&store.events_path).await? {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&store.events_path)
                .await
                .map_err(|e| StoreError::io(&store.events_path, e))?;
        }

        Ok(store)
    }

    /// The data directory this store lives in
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        fs::try_exists(path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    async fn read_state_file(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.state_path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.state_path, e)),
        }
    }

    async fn stored_version(&self) -> Result<u64, StoreError> {
        match self.read_state_file().await? {
            Some(content) => Ok(serde_json::from_str::<VersionProbe>(&content)?.version),
            None => Ok(0),
        }
    }

    async fn write_document(&self, doc: &StateDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(doc)?;
        write_atomically(&self.state_path, &content).await
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<StateDocument, StoreError> {
        match self.read_state_file().await? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(StateDocument::empty(Utc::now())),
        }
    }

    async fn save(&self, doc: &mut StateDocument) -> Result<(), StoreError> {
        let found = self.stored_version().await?;
        if found != doc.version {
            return Err(StoreError::VersionConflict {
                expected: doc.version,
                found,
            });
        }

        doc.bump(Utc::now());
        self.write_document(doc).await?;

        tracing::debug!(version = doc.version, "State document saved");
        Ok(())
    }

    async fn append_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await
            .map_err(|e| StoreError::io(&self.events_path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::io(&self.events_path, e))?;
        file.flush()
            .await
            .map_err(|e| StoreError::io(&self.events_path, e))?;

        Ok(())
    }

    async fn read_events(&self) -> Result<Vec<Event>, StoreError> {
        let content = match fs::read_to_string(&self.events_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.events_path, e)),
        };

        let mut events = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(line = number + 1, error = %e, "Skipping unreadable journal line")
                }
            }
        }

        Ok(events)
    }
}
