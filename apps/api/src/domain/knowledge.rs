use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic value object naming a knowledge note
///
/// # Invariants
/// - Not empty
/// - Usable as a single file name: no path separators, no `..`, no NUL
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Creates a new Topic value object
    ///
    /// # Example
    /// ```
    /// use crewboard::domain::Topic;
    ///
    /// assert!(Topic::new("api-design").is_ok());
    /// assert!(Topic::new("../etc/passwd").is_err());
    /// ```
    pub fn new(topic: impl Into<String>) -> Result<Self, String> {
        let topic = topic.into();
        if Self::is_valid(&topic) {
            Ok(Topic(topic))
        } else {
            Err(format!("Invalid knowledge topic: {:?}", topic))
        }
    }

    fn is_valid(topic: &str) -> bool {
        !topic.trim().is_empty()
            && !topic.contains(['/', '\\', '\0'])
            && !topic.contains("..")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Topic {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Prepends the provenance header to a note body.
///
/// The header is one HTML comment line naming the writer and the write time.
pub fn compose_document(agent_id: &str, written_at: DateTime<Utc>, content: &str) -> String {
    format!(
        "<!-- agent: {} | updated: {} -->\n{}",
        agent_id,
        written_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        content
    )
}
