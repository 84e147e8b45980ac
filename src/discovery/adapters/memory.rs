//! In-memory derived-task repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::channel::domain::ProjectId;
use crate::discovery::{
    domain::{DerivedTask, DerivedTaskId, DerivedTaskStatus},
    ports::{DerivedTaskRepository, DerivedTaskRepositoryError, DerivedTaskRepositoryResult},
};
use crate::message::domain::MessageId;

#[derive(Debug, Default)]
struct State {
    tasks: HashMap<DerivedTaskId, DerivedTask>,
    evidence_index: HashMap<MessageId, DerivedTaskId>,
}

/// Thread-safe in-memory derived-task repository.
///
/// Mirrors the relational adapter's uniqueness rules: one task per
/// identifier and one task per source message.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDerivedTaskRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryDerivedTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn len(&self) -> DerivedTaskRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.len())
    }

    /// Returns whether the repository holds no tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn is_empty(&self) -> DerivedTaskRepositoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> DerivedTaskRepositoryError {
    DerivedTaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DerivedTaskRepository for InMemoryDerivedTaskRepository {
    async fn store(&self, task: &DerivedTask) -> DerivedTaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(DerivedTaskRepositoryError::DuplicateTask(task.id()));
        }
        if state.evidence_index.contains_key(task.source_message_id()) {
            return Err(DerivedTaskRepositoryError::DuplicateEvidence(
                task.source_message_id().clone(),
            ));
        }
        state
            .evidence_index
            .insert(task.source_message_id().clone(), task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: DerivedTaskId,
    ) -> DerivedTaskRepositoryResult<Option<DerivedTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn exists_for_source(
        &self,
        source_message_id: &MessageId,
    ) -> DerivedTaskRepositoryResult<bool> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.evidence_index.contains_key(source_message_id))
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
        status: Option<DerivedTaskStatus>,
    ) -> DerivedTaskRepositoryResult<Vec<DerivedTask>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<DerivedTask> = state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .filter(|task| status.is_none_or(|wanted| task.status() == wanted))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(tasks)
    }

    async fn update_transition(
        &self,
        task: &DerivedTask,
        expected_prior: DerivedTaskStatus,
    ) -> DerivedTaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(DerivedTaskRepositoryError::NotFound(task.id()))?;
        if stored.status() != expected_prior {
            return Err(DerivedTaskRepositoryError::StateConflict {
                found: stored.status(),
            });
        }
        *stored = task.clone();
        Ok(())
    }
}
