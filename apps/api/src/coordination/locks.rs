use chrono::{DateTime, Utc};
use serde_json::json;

use super::errors::{require_non_empty, CoordinationResult};
use super::{Coordinator, Mutation};
use crate::domain::event::{actions, Event, SYSTEM_AGENT};
use crate::domain::lock::{AcquireOutcome, Lock, LockView, DEFAULT_LOCK_TTL_MS};
use crate::domain::state::StateDocument;

/// Views of the locks in `doc` whose lease has not lapsed at `now`
pub(crate) fn live_locks(doc: &StateDocument, now: DateTime<Utc>) -> Vec<LockView> {
    doc.locks
        .iter()
        .filter(|(_, lock)| !lock.is_expired_at(now))
        .map(|(resource, lock)| LockView::new(resource, lock))
        .collect()
}

impl Coordinator {
    /// Tries to lease `resource` to `agent_id` for `ttl_ms` milliseconds
    ///
    /// Granted when the resource is free, its lease has lapsed, or
    /// `agent_id` already holds it (which refreshes the lease). Otherwise
    /// returns [`AcquireOutcome::Held`] with the current holder and changes
    /// nothing.
    pub async fn acquire_lock(
        &self,
        resource: &str,
        agent_id: &str,
        ttl_ms: Option<u64>,
    ) -> CoordinationResult<AcquireOutcome> {
        require_non_empty("Resource", resource)?;
        require_non_empty("Agent id", agent_id)?;
        let ttl_ms = ttl_ms.unwrap_or(DEFAULT_LOCK_TTL_MS);

        let outcome = self
            .mutate(|doc, now| {
                if let Some(existing) = doc.locks.get(resource) {
                    if !existing.can_be_taken_by(agent_id, now) {
                        return Ok(Mutation::Unchanged(AcquireOutcome::Held(LockView::new(
                            resource, existing,
                        ))));
                    }
                }

                let lock = Lock::new(agent_id, ttl_ms, now);
                let view = LockView::new(resource, &lock);
                doc.locks.insert(resource.to_string(), lock);

                Ok(Mutation::Commit {
                    value: AcquireOutcome::Acquired(view),
                    event: Event::at(
                        now,
                        agent_id,
                        actions::LOCK_ACQUIRED,
                        json!({ "resource": resource, "ttlMs": ttl_ms }),
                    ),
                })
            })
            .await?;

        match &outcome {
            AcquireOutcome::Acquired(_) => {
                tracing::info!(resource, agent = agent_id, ttl_ms, "Lock acquired")
            }
            AcquireOutcome::Held(lock) => tracing::debug!(
                resource,
                agent = agent_id,
                holder = %lock.agent,
                "Lock denied"
            ),
        }
        Ok(outcome)
    }

    /// Releases `resource` if `agent_id` holds it; `false` otherwise
    pub async fn release_lock(&self, resource: &str, agent_id: &str) -> CoordinationResult<bool> {
        let released = self
            .mutate(|doc, now| {
                let held_by_caller = doc
                    .locks
                    .get(resource)
                    .is_some_and(|lock| lock.agent == agent_id);
                if !held_by_caller {
                    return Ok(Mutation::Unchanged(false));
                }

                doc.locks.remove(resource);
                Ok(Mutation::Commit {
                    value: true,
                    event: Event::at(
                        now,
                        agent_id,
                        actions::LOCK_RELEASED,
                        json!({ "resource": resource }),
                    ),
                })
            })
            .await?;

        if released {
            tracing::info!(resource, agent = agent_id, "Lock released");
        } else {
            tracing::debug!(resource, agent = agent_id, "Release by non-holder ignored");
        }
        Ok(released)
    }

    /// Locks whose lease has not lapsed
    pub async fn list_locks(&self) -> CoordinationResult<Vec<LockView>> {
        let doc = self.store.load().await?;
        Ok(live_locks(&doc, Utc::now()))
    }

    /// Drops stored lock entries whose lease has lapsed.
    ///
    /// Expired entries already behave as free, so this only compacts
    /// storage. Returns the pruned resource names.
    pub async fn prune_expired_locks(&self) -> CoordinationResult<Vec<String>> {
        let pruned = self
            .mutate(|doc, now| {
                let expired: Vec<String> = doc
                    .locks
                    .iter()
                    .filter(|(_, lock)| lock.is_expired_at(now))
                    .map(|(resource, _)| resource.clone())
                    .collect();
                if expired.is_empty() {
                    return Ok(Mutation::Unchanged(expired));
                }

                for resource in &expired {
                    doc.locks.remove(resource);
                }
                Ok(Mutation::Commit {
                    event: Event::at(
                        now,
                        SYSTEM_AGENT,
                        actions::LOCKS_PRUNED,
                        json!({ "resources": expired }),
                    ),
                    value: expired,
                })
            })
            .await?;

        if !pruned.is_empty() {
            tracing::info!(count = pruned.len(), "Pruned expired locks");
        }
        Ok(pruned)
    }
}
