use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Lease length used when a caller does not give one
pub const DEFAULT_LOCK_TTL_MS: u64 = 300_000;

/// A TTL-bounded lease over a named resource
///
/// The resource name is the key the lock is stored under. Expiry is
/// computed on read; an expired entry stays stored until it is released,
/// overwritten by the next acquire, or pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    pub agent: String,
    pub acquired_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl Lock {
    pub fn new(agent: &str, ttl_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            agent: agent.to_string(),
            acquired_at: now,
            ttl_ms,
        }
    }

    /// Instant the lease lapses, `None` when the TTL is too large to represent
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = i64::try_from(self.ttl_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)?;
        self.acquired_at.checked_add_signed(ttl)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| expiry < now)
    }

    /// Whether `agent` may take this lease: it lapsed, or `agent` already holds it
    pub fn can_be_taken_by(&self, agent: &str, now: DateTime<Utc>) -> bool {
        self.agent == agent || self.is_expired_at(now)
    }
}

/// A lock as reported to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
    pub resource: String,
    pub agent: String,
    pub acquired_at: DateTime<Utc>,
    pub ttl_ms: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LockView {
    pub fn new(resource: &str, lock: &Lock) -> Self {
        Self {
            resource: resource.to_string(),
            agent: lock.agent.clone(),
            acquired_at: lock.acquired_at,
            ttl_ms: lock.ttl_ms,
            expires_at: lock.expires_at(),
        }
    }
}

/// Result of an acquire attempt. Denial is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquireOutcome {
    /// The lease was granted (or refreshed for the same holder)
    Acquired(LockView),
    /// Another agent holds an unexpired lease
    Held(LockView),
}

impl AcquireOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired(_))
    }

    pub fn lock(&self) -> &LockView {
        match self {
            AcquireOutcome::Acquired(lock) | AcquireOutcome::Held(lock) => lock,
        }
    }
}
