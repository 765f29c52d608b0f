use serde_json::{json, Value};

use super::errors::{require_non_empty, CoordinationError, CoordinationResult};
use super::{Coordinator, Mutation};
use crate::domain::event::{actions, Event, SYSTEM_AGENT};
use crate::domain::state::StateDocument;
use crate::domain::workstream::{NewTask, NewWorkstream, Task, Workstream, WorkstreamSummary};

fn workstream_mut<'a>(
    doc: &'a mut StateDocument,
    name: &str,
) -> CoordinationResult<&'a mut Workstream> {
    doc.workstreams
        .get_mut(name)
        .ok_or_else(|| CoordinationError::WorkstreamNotFound(name.to_string()))
}

fn task_mut<'a>(
    workstream: &'a mut Workstream,
    workstream_name: &str,
    task_id: &str,
) -> CoordinationResult<&'a mut Task> {
    workstream
        .task_mut(task_id)
        .ok_or_else(|| CoordinationError::TaskNotFound {
            workstream: workstream_name.to_string(),
            task_id: task_id.to_string(),
        })
}

/// Workstream summaries sorted by priority; equal priorities keep map order
pub(crate) fn summarize(doc: &StateDocument) -> Vec<WorkstreamSummary> {
    let mut summaries: Vec<_> = doc
        .workstreams
        .iter()
        .map(|(name, ws)| WorkstreamSummary::new(name, ws))
        .collect();
    summaries.sort_by_key(|s| s.workstream.priority);
    summaries
}

impl Coordinator {
    /// Creates a workstream under a new name
    ///
    /// # Errors
    /// * `AlreadyExists` - the name is taken
    /// * `Validation` - the name is empty
    pub async fn create_workstream(
        &self,
        name: &str,
        draft: NewWorkstream,
    ) -> CoordinationResult<Workstream> {
        require_non_empty("Workstream name", name)?;

        let workstream = self
            .mutate(|doc, now| {
                if doc.workstreams.contains_key(name) {
                    return Err(CoordinationError::AlreadyExists(name.to_string()));
                }
                let workstream = Workstream::new(draft.clone(), now);
                doc.workstreams.insert(name.to_string(), workstream.clone());

                Ok(Mutation::Commit {
                    event: Event::at(
                        now,
                        SYSTEM_AGENT,
                        actions::WORKSTREAM_CREATED,
                        json!({ "workstream": name, "priority": workstream.priority }),
                    ),
                    value: workstream,
                })
            })
            .await?;

        tracing::info!(workstream = name, priority = workstream.priority, "Workstream created");
        Ok(workstream)
    }

    /// All workstreams with task counts, most urgent first
    pub async fn list_workstreams(&self) -> CoordinationResult<Vec<WorkstreamSummary>> {
        let doc = self.store.load().await?;
        Ok(summarize(&doc))
    }

    /// Tasks of one workstream in creation order
    pub async fn list_tasks(&self, workstream: &str) -> CoordinationResult<Vec<Task>> {
        let doc = self.store.load().await?;
        doc.workstreams
            .get(workstream)
            .map(|ws| ws.tasks.clone())
            .ok_or_else(|| CoordinationError::WorkstreamNotFound(workstream.to_string()))
    }

    /// Appends a pending task to a workstream
    pub async fn add_task(&self, workstream: &str, draft: NewTask) -> CoordinationResult<Task> {
        let task = self
            .mutate(|doc, now| {
                let ws = workstream_mut(doc, workstream)?;
                let task = ws
                    .add_task(draft.clone(), now)
                    .map_err(CoordinationError::Validation)?;

                Ok(Mutation::Commit {
                    event: Event::at(
                        now,
                        SYSTEM_AGENT,
                        actions::TASK_CREATED,
                        json!({
                            "workstream": workstream,
                            "taskId": task.id,
                            "title": task.title,
                            "priority": task.priority,
                        }),
                    ),
                    value: task,
                })
            })
            .await?;

        tracing::info!(workstream, task_id = %task.id, priority = task.priority, "Task created");
        Ok(task)
    }

    /// Moves a pending task to in_progress for `agent_id`
    ///
    /// # Errors
    /// * `WorkstreamNotFound` / `TaskNotFound` - unknown target
    /// * `InvalidState` - the task is not pending
    pub async fn claim_task(
        &self,
        workstream: &str,
        task_id: &str,
        agent_id: &str,
    ) -> CoordinationResult<Task> {
        require_non_empty("Agent id", agent_id)?;

        let task = self
            .mutate(|doc, now| {
                let ws = workstream_mut(doc, workstream)?;
                let task = task_mut(ws, workstream, task_id)?;
                claim(task, workstream, agent_id, now)
            })
            .await?;

        tracing::info!(workstream, task_id, agent = agent_id, "Task claimed");
        Ok(task)
    }

    /// Marks a task done with `result`, whatever its current status
    pub async fn complete_task(
        &self,
        workstream: &str,
        task_id: &str,
        result: Option<Value>,
    ) -> CoordinationResult<Task> {
        let task = self
            .mutate(|doc, now| {
                let ws = workstream_mut(doc, workstream)?;
                let task = task_mut(ws, workstream, task_id)?;
                task.complete(result.clone(), now);

                let agent = task.assigned_to.as_deref().unwrap_or(SYSTEM_AGENT);
                Ok(Mutation::Commit {
                    event: Event::at(
                        now,
                        agent,
                        actions::TASK_COMPLETED,
                        json!({ "workstream": workstream, "taskId": task.id }),
                    ),
                    value: task.clone(),
                })
            })
            .await?;

        tracing::info!(workstream, task_id, "Task completed");
        Ok(task)
    }

    /// Claims the most urgent pending task of a workstream for `agent_id`
    ///
    /// Returns `None` when nothing is pending. Selection and claim happen in
    /// one mutation, so two agents asking at once never get the same task.
    pub async fn next_task(
        &self,
        workstream: &str,
        agent_id: &str,
    ) -> CoordinationResult<Option<Task>> {
        require_non_empty("Agent id", agent_id)?;

        let task = self
            .mutate(|doc, now| {
                let ws = workstream_mut(doc, workstream)?;
                let Some(task_id) = ws.next_pending().map(|t| t.id.clone()) else {
                    return Ok(Mutation::Unchanged(None));
                };
                let task = task_mut(ws, workstream, &task_id)?;
                Ok(claim(task, workstream, agent_id, now)?.map(Some))
            })
            .await?;

        match &task {
            Some(task) => {
                tracing::info!(workstream, task_id = %task.id, agent = agent_id, "Next task claimed")
            }
            None => tracing::debug!(workstream, agent = agent_id, "No pending task"),
        }
        Ok(task)
    }
}

fn claim(
    task: &mut Task,
    workstream: &str,
    agent_id: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> CoordinationResult<Mutation<Task>> {
    task.claim(agent_id, now)
        .map_err(CoordinationError::InvalidState)?;

    Ok(Mutation::Commit {
        event: Event::at(
            now,
            agent_id,
            actions::TASK_CLAIMED,
            json!({ "workstream": workstream, "taskId": task.id }),
        ),
        value: task.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::create_test_coordinator;
    use super::*;
    use crate::domain::workstream::TaskStatus;

    #[tokio::test]
    async fn create_workstream_twice_fails_without_changing_state() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let after_first = coordinator.load_state().await.unwrap();

        let err = coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinationError::AlreadyExists(name) if name == "w"));
        assert_eq!(coordinator.load_state().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn empty_workstream_name_is_rejected() {
        let (_temp, coordinator) = create_test_coordinator().await;
        let err = coordinator
            .create_workstream("", NewWorkstream::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Validation(_)));
    }

    #[tokio::test]
    async fn list_workstreams_sorts_by_priority() {
        let (_temp, coordinator) = create_test_coordinator().await;
        for (name, priority) in [("low", 9), ("high", 1), ("mid", 5)] {
            coordinator
                .create_workstream(
                    name,
                    NewWorkstream {
                        priority: Some(priority),
                        ..NewWorkstream::default()
                    },
                )
                .await
                .unwrap();
        }

        let names: Vec<_> = coordinator
            .list_workstreams()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn add_task_to_missing_workstream_is_not_found() {
        let (_temp, coordinator) = create_test_coordinator().await;
        let err = coordinator
            .add_task("nope", NewTask::titled("T"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::WorkstreamNotFound(_)));
    }

    #[tokio::test]
    async fn add_task_with_empty_title_is_rejected() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let err = coordinator
            .add_task("w", NewTask::titled(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Validation(_)));
        assert_eq!(coordinator.load_state().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn claim_unknown_task_is_not_found() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let err = coordinator
            .claim_task("w", "00000000", "a1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn complete_records_assignee_as_event_agent() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let claimed = coordinator.add_task("w", NewTask::titled("a")).await.unwrap();
        let unclaimed = coordinator.add_task("w", NewTask::titled("b")).await.unwrap();
        coordinator.claim_task("w", &claimed.id, "a1").await.unwrap();

        coordinator.complete_task("w", &claimed.id, None).await.unwrap();
        let done = coordinator
            .complete_task("w", &unclaimed.id, None)
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Done);

        let events = coordinator.store.read_events().await.unwrap();
        let completions: Vec<_> = events
            .iter()
            .filter(|e| e.action == actions::TASK_COMPLETED)
            .map(|e| e.agent.as_str())
            .collect();
        assert_eq!(completions, vec!["a1", SYSTEM_AGENT]);
    }

    #[tokio::test]
    async fn next_task_on_drained_workstream_returns_none_without_saving() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let version = coordinator.load_state().await.unwrap().version;

        assert!(coordinator.next_task("w", "a1").await.unwrap().is_none());
        assert_eq!(coordinator.load_state().await.unwrap().version, version);
    }

    #[tokio::test]
    async fn list_tasks_keeps_creation_order() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        let a = coordinator
            .add_task("w", NewTask::titled("a").with_priority(9))
            .await
            .unwrap();
        let b = coordinator
            .add_task("w", NewTask::titled("b").with_priority(1))
            .await
            .unwrap();

        let ids: Vec<_> = coordinator
            .list_tasks("w")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn next_task_claims_most_urgent_and_journals_the_claim() {
        let (_temp, coordinator) = create_test_coordinator().await;
        coordinator
            .create_workstream("w", NewWorkstream::default())
            .await
            .unwrap();
        coordinator
            .add_task("w", NewTask::titled("later").with_priority(3))
            .await
            .unwrap();
        let urgent = coordinator
            .add_task("w", NewTask::titled("urgent").with_priority(1))
            .await
            .unwrap();

        let next = coordinator.next_task("w", "a1").await.unwrap().unwrap();
        assert_eq!(next.id, urgent.id);
        assert_eq!(next.status, TaskStatus::InProgress);
        assert_eq!(coordinator.load_state().await.unwrap().version, 4);

        let last = coordinator.store.read_events().await.unwrap().pop().unwrap();
        assert_eq!(last.action, actions::TASK_CLAIMED);
        assert_eq!(last.agent, "a1");
        assert_eq!(last.field("taskId"), Some(&json!(urgent.id)));
    }
}
