// Coordination engine
//
// Every mutating operation runs load -> validate/apply -> save -> journal
// against the shared state document. Calls are serialized through one gate
// per Coordinator, and a save that lost a race with another process is
// retried from a fresh load.

pub mod errors;
mod journal;
mod knowledge;
mod locks;
mod registry;
mod status;
mod workstreams;

pub use errors::{CoordinationError, CoordinationResult};
pub use knowledge::KnowledgeNote;
pub use status::{StatusSnapshot, RECENT_EVENT_COUNT};

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::event::Event;
use crate::domain::repositories::{KnowledgeRepository, StateStore, StoreError};
use crate::domain::state::StateDocument;
use crate::infrastructure::repositories::{FileKnowledgeRepository, FileStateStore};

/// How many times a mutation is attempted when its save loses a version race
pub const MAX_SAVE_ATTEMPTS: usize = 3;

/// Outcome of applying one change to a loaded document
pub(crate) enum Mutation<T> {
    /// Persist the document and journal `event`
    Commit { value: T, event: Event },
    /// Persist the document without a journal record
    Quiet(T),
    /// Nothing changed; skip the save so the version does not move
    Unchanged(T),
}

impl<T> Mutation<T> {
    /// Transforms the returned value, keeping the persistence decision
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Mutation<U> {
        match self {
            Mutation::Commit { value, event } => Mutation::Commit {
                value: f(value),
                event,
            },
            Mutation::Quiet(value) => Mutation::Quiet(f(value)),
            Mutation::Unchanged(value) => Mutation::Unchanged(f(value)),
        }
    }
}

/// The state-mutation engine shared by the CLI and the HTTP server
///
/// Holds no state of its own beyond its storage handles: every call
/// re-reads the store.
pub struct Coordinator {
    store: Arc<dyn StateStore>,
    knowledge: Arc<dyn KnowledgeRepository>,
    write_gate: Mutex<()>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn StateStore>, knowledge: Arc<dyn KnowledgeRepository>) -> Self {
        Self {
            store,
            knowledge,
            write_gate: Mutex::new(()),
        }
    }

    /// Builds a coordinator over the file-backed stores in `data_dir`
    pub async fn open(data_dir: impl AsRef<Path>) -> CoordinationResult<Self> {
        let data_dir = data_dir.as_ref();
        let store = FileStateStore::open(data_dir).await?;
        let knowledge = FileKnowledgeRepository::open(data_dir).await?;
        tracing::debug!(data_dir = %data_dir.display(), "Opened coordination store");
        Ok(Self::new(Arc::new(store), Arc::new(knowledge)))
    }

    /// The full state document as currently persisted
    pub async fn load_state(&self) -> CoordinationResult<StateDocument> {
        Ok(self.store.load().await?)
    }

    /// Runs one read-modify-write cycle.
    ///
    /// `apply` may run more than once if the save hits a version conflict,
    /// each time against a freshly loaded document. Once the save succeeds
    /// the value is returned even if the journal append fails.
    pub(crate) async fn mutate<T, F>(&self, mut apply: F) -> CoordinationResult<T>
    where
        F: FnMut(&mut StateDocument, DateTime<Utc>) -> CoordinationResult<Mutation<T>> + Send,
        T: Send,
    {
        let _gate = self.write_gate.lock().await;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut doc = self.store.load().await?;

            let (value, event) = match apply(&mut doc, Utc::now())? {
                Mutation::Unchanged(value) => return Ok(value),
                Mutation::Commit { value, event } => (value, Some(event)),
                Mutation::Quiet(value) => (value, None),
            };

            match self.store.save(&mut doc).await {
                Ok(()) => {
                    // The state is already committed; a lost journal record
                    // must not turn that into a failure.
                    if let Some(event) = &event {
                        if let Err(e) = self.store.append_event(event).await {
                            tracing::warn!(
                                action = %event.action,
                                error = %e,
                                "Committed mutation could not be journaled"
                            );
                        }
                    }
                    tracing::debug!(version = doc.version, "Mutation committed");
                    return Ok(value);
                }
                Err(StoreError::VersionConflict { expected, found })
                    if attempt < MAX_SAVE_ATTEMPTS =>
                {
                    tracing::warn!(
                        expected,
                        found,
                        attempt,
                        "State changed underneath mutation, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Appends a journal record outside of a state mutation
    async fn append_journal(&self, event: &Event) -> CoordinationResult<()> {
        let _gate = self.write_gate.lock().await;
        self.store.append_event(event).await?;
        Ok(())
    }
}
