//! In-memory task store.
//!
//! Owns every task record for the life of the process. All mutation goes
//! through the store's operations; callers receive cloned snapshots.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use veo_models::{Task, TaskId, TaskUpdate, TransitionError, VideoSpec};

use crate::metrics;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Maximum concurrent tasks ({limit}) reached. Please try again later.")]
    CapacityExceeded { limit: usize },

    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("{message}")]
    Conflict { task_id: TaskId, message: String },
}

#[derive(Default)]
struct TaskTable {
    tasks: HashMap<TaskId, Task>,
    /// Insertion order
    order: VecDeque<TaskId>,
    /// Non-terminal task count
    active: usize,
}

impl TaskTable {
    /// Drop the oldest terminal records beyond `max_retained`.
    fn evict(&mut self, max_retained: usize) {
        let excess = self.tasks.len().saturating_sub(max_retained);
        if excess == 0 {
            return;
        }

        let victims: HashSet<TaskId> = self
            .order
            .iter()
            .filter(|id| self.tasks.get(*id).is_some_and(Task::is_terminal))
            .take(excess)
            .cloned()
            .collect();

        for id in &victims {
            self.tasks.remove(id);
        }
        self.order.retain(|id| !victims.contains(id));
        debug!("Evicted {} finished tasks", victims.len());
    }
}

/// Process-wide task table.
pub struct TaskStore {
    inner: RwLock<TaskTable>,
    max_active: usize,
    max_retained: usize,
}

impl TaskStore {
    pub fn new(max_active: usize, max_retained: usize) -> Self {
        Self {
            inner: RwLock::new(TaskTable::default()),
            max_active,
            max_retained,
        }
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Admit a new task in `processing` state.
    ///
    /// The capacity check and the insert happen under one write lock.
    pub async fn create(&self, spec: VideoSpec) -> Result<Task, StoreError> {
        let mut table = self.inner.write().await;
        if table.active >= self.max_active {
            return Err(StoreError::CapacityExceeded {
                limit: self.max_active,
            });
        }

        let task = Task::new(spec);
        table.order.push_back(task.task_id.clone());
        table.tasks.insert(task.task_id.clone(), task.clone());
        table.active += 1;
        table.evict(self.max_retained);

        metrics::set_active_tasks(table.active);
        Ok(task)
    }

    pub async fn get(&self, task_id: &TaskId) -> Option<Task> {
        self.inner.read().await.tasks.get(task_id).cloned()
    }

    /// All retained tasks in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        let table = self.inner.read().await;
        table
            .order
            .iter()
            .filter_map(|id| table.tasks.get(id).cloned())
            .collect()
    }

    pub async fn update_status(&self, task_id: &TaskId, update: TaskUpdate) -> Result<Task, StoreError> {
        self.mutate(task_id, |task| {
            let target = update.status;
            task.apply(update).map_err(|e| match e {
                TransitionError::Terminal(status) => format!("Task is already {}", status),
                TransitionError::Backward { from, to } => {
                    format!("Cannot move task from {} to {}", from, to)
                }
                TransitionError::MissingVideoUrl => {
                    format!("Cannot mark task {} without a video URL", target)
                }
            })
        })
        .await
    }

    pub async fn cancel(&self, task_id: &TaskId) -> Result<Task, StoreError> {
        self.mutate(task_id, |task| {
            let status = task.status;
            task.cancel()
                .map_err(|_| format!("Cannot cancel task with status: {}", status))
        })
        .await
    }

    async fn mutate<F>(&self, task_id: &TaskId, f: F) -> Result<Task, StoreError>
    where
        F: FnOnce(&mut Task) -> Result<(), String>,
    {
        let mut table = self.inner.write().await;
        let task = table
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.clone()))?;

        f(task).map_err(|message| StoreError::Conflict {
            task_id: task_id.clone(),
            message,
        })?;

        let snapshot = task.clone();
        if snapshot.is_terminal() {
            table.active = table.active.saturating_sub(1);
            metrics::set_active_tasks(table.active);
        }
        Ok(snapshot)
    }

    /// Non-terminal task count.
    pub async fn active_count(&self) -> usize {
        self.inner.read().await.active
    }

    /// Retained task count.
    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_err, assert_ok};
    use veo_models::{GenerationLimits, TaskStatus, VideoGenerationRequest};

    use super::*;

    fn spec(prompt: &str) -> VideoSpec {
        VideoGenerationRequest::with_prompt(prompt)
            .validate_with(&GenerationLimits::default())
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = TaskStore::new(10, 100);
        let task = store.create(spec("A cat")).await.unwrap();

        let fetched = store.get(&task.task_id).await.unwrap();
        assert_eq!(fetched.status, TaskStatus::Processing);
        assert_eq!(fetched.progress, 0);
        assert_eq!(store.active_count().await, 1);
        assert!(store.get(&TaskId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let store = TaskStore::new(2, 100);
        assert_ok!(store.create(spec("one")).await);
        let second = store.create(spec("two")).await.unwrap();

        let err = store.create(spec("three")).await.unwrap_err();
        assert!(matches!(err, StoreError::CapacityExceeded { limit: 2 }));

        // Finishing a task frees a slot.
        store
            .update_status(&second.task_id, TaskUpdate::completed("https://v/1.mp4"))
            .await
            .unwrap();
        assert_ok!(store.create(spec("three")).await);
    }

    #[tokio::test]
    async fn test_concurrent_admission_respects_limit() {
        let store = Arc::new(TaskStore::new(5, 100));
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(spec(&format!("prompt {}", i))).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
        assert_eq!(store.active_count().await, 5);
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let store = TaskStore::new(10, 100);
        let a = store.create(spec("a")).await.unwrap();
        let b = store.create(spec("b")).await.unwrap();
        let c = store.create(spec("c")).await.unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec![a.task_id, b.task_id, c.task_id]);
    }

    #[tokio::test]
    async fn test_update_rejects_backward_and_terminal() {
        let store = TaskStore::new(10, 100);
        let task = store.create(spec("x")).await.unwrap();
        let id = task.task_id.clone();

        let updated = store
            .update_status(&id, TaskUpdate::stage(TaskStatus::Generating, 30))
            .await
            .unwrap();
        assert_eq!(updated.progress, 30);

        let err = store
            .update_status(&id, TaskUpdate::stage(TaskStatus::AnalyzingPrompt, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let failed = store
            .update_status(&id, TaskUpdate::failed("quota exceeded"))
            .await
            .unwrap();
        assert_eq!(failed.error.as_deref(), Some("quota exceeded"));
        assert!(failed.completed_at.is_some());
        assert_eq!(store.active_count().await, 0);

        assert_err!(
            store
                .update_status(&id, TaskUpdate::stage(TaskStatus::Finalizing, 80))
                .await
        );
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let store = TaskStore::new(10, 100);
        let id = store.create(spec("x")).await.unwrap().task_id;

        store
            .update_status(&id, TaskUpdate::stage(TaskStatus::Generating, 50))
            .await
            .unwrap();
        let task = store
            .update_status(&id, TaskUpdate::stage(TaskStatus::Generating, 35))
            .await
            .unwrap();
        assert_eq!(task.progress, 50);
    }

    #[tokio::test]
    async fn test_cancel() {
        let store = TaskStore::new(10, 100);
        let id = store.create(spec("x")).await.unwrap().task_id;

        let cancelled = store.cancel(&id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
        assert!(cancelled.completed_at.is_some());
        assert_eq!(store.active_count().await, 0);

        match store.cancel(&id).await.unwrap_err() {
            StoreError::Conflict { message, .. } => {
                assert_eq!(message, "Cannot cancel task with status: cancelled")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(matches!(
            store.cancel(&TaskId::new()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_completed_task_conflicts() {
        let store = TaskStore::new(10, 100);
        let id = store.create(spec("x")).await.unwrap().task_id;
        assert_ok!(
            store
                .update_status(&id, TaskUpdate::completed("https://example.com/v.mp4"))
                .await
        );

        match store.cancel(&id).await.unwrap_err() {
            StoreError::Conflict { message, .. } => {
                assert_eq!(message, "Cannot cancel task with status: completed")
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let task = store.get(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.video_url.as_deref(), Some("https://example.com/v.mp4"));
    }

    #[tokio::test]
    async fn test_evicts_oldest_finished_tasks() {
        let store = TaskStore::new(10, 2);
        let first = store.create(spec("1")).await.unwrap().task_id;
        let second = store.create(spec("2")).await.unwrap().task_id;
        store.cancel(&second).await.unwrap();

        // `first` is still active and must survive.
        let third = store.create(spec("3")).await.unwrap().task_id;
        assert_eq!(store.len().await, 2);
        assert!(store.get(&first).await.is_some());
        assert!(store.get(&second).await.is_none());
        assert!(store.get(&third).await.is_some());
    }
}
