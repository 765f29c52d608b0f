use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::event::Event;
use crate::domain::state::StateDocument;

/// Errors raised by storage adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State version conflict: loaded at version {expected}, store is at version {found}")]
    VersionConflict { expected: u64, found: u64 },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Storage contract for the shared state document and the event journal
///
/// Implementations never cache: every `load` observes the latest save.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current state document
    async fn load(&self) -> Result<StateDocument, StoreError>;

    /// Persist `doc` as the next version.
    ///
    /// `doc.version` must be the version it was loaded at; if the stored
    /// version has moved since, the save is rejected with
    /// [`StoreError::VersionConflict`]. On success `doc.version` is
    /// incremented and `doc.updated_at` refreshed.
    async fn save(&self, doc: &mut StateDocument) -> Result<(), StoreError>;

    /// Append one record to the journal
    async fn append_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Read the whole journal in append order
    async fn read_events(&self) -> Result<Vec<Event>, StoreError>;
}
