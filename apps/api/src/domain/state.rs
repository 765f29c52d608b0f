use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::agent::Agent;
use super::lock::Lock;
use super::workstream::Workstream;

/// The single shared root document
///
/// # Invariants
/// - `version` grows by exactly one per successful save
/// - `updated_at` never moves backwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub workstreams: BTreeMap<String, Workstream>,
    #[serde(default)]
    pub agents: BTreeMap<String, Agent>,
    #[serde(default)]
    pub locks: BTreeMap<String, Lock>,
}

impl StateDocument {
    /// An empty document at version 0
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            updated_at: now,
            workstreams: BTreeMap::new(),
            agents: BTreeMap::new(),
            locks: BTreeMap::new(),
        }
    }

    /// Advances the document to its next version
    pub fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = self.updated_at.max(now);
    }
}
