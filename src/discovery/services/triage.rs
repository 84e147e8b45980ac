//! Triage service for the derived-task approval lifecycle.

use crate::channel::domain::ProjectId;
use crate::discovery::{
    domain::{DerivedTask, DerivedTaskId, DerivedTaskStatus, DiscoveryDomainError, WorkspaceTaskId},
    ports::{DerivedTaskRepository, DerivedTaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for triage operations.
#[derive(Debug, Error)]
pub enum DerivedTaskTriageError {
    /// No task with the given identifier exists.
    #[error("derived task {0} not found")]
    NotFound(DerivedTaskId),

    /// The lifecycle forbids the requested transition.
    #[error(transparent)]
    Domain(#[from] DiscoveryDomainError),

    /// Derived-task persistence failed.
    #[error(transparent)]
    Repository(#[from] DerivedTaskRepositoryError),
}

/// Result type for triage operations.
pub type DerivedTaskTriageResult<T> = Result<T, DerivedTaskTriageError>;

/// Accepts, rejects, and finalizes derived tasks.
///
/// Every transition is persisted conditionally on the status the task was
/// loaded with, so two concurrent decisions cannot both win.
#[derive(Clone)]
pub struct DerivedTaskService<D, C>
where
    D: DerivedTaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<D>,
    clock: Arc<C>,
}

impl<D, C> DerivedTaskService<D, C>
where
    D: DerivedTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new triage service.
    #[must_use]
    pub const fn new(repository: Arc<D>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Approves a suggested task for workspace task creation.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskTriageError::NotFound`] when the task is missing
    /// or [`DerivedTaskTriageError::Domain`] when it is not suggested.
    pub async fn accept(&self, id: DerivedTaskId) -> DerivedTaskTriageResult<DerivedTask> {
        self.transition(id, |task, clock| task.accept(clock)).await
    }

    /// Declines a suggested task, keeping it as evidence.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskTriageError::NotFound`] when the task is missing
    /// or [`DerivedTaskTriageError::Domain`] when it is not suggested.
    pub async fn reject(&self, id: DerivedTaskId) -> DerivedTaskTriageResult<DerivedTask> {
        self.transition(id, |task, clock| task.reject(clock)).await
    }

    /// Records the workspace task created from an accepted suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskTriageError::NotFound`] when the task is missing
    /// or [`DerivedTaskTriageError::Domain`] when it is not accepted.
    pub async fn mark_created(
        &self,
        id: DerivedTaskId,
        workspace_task_id: WorkspaceTaskId,
    ) -> DerivedTaskTriageResult<DerivedTask> {
        self.transition(id, |task, clock| task.mark_created(workspace_task_id, clock))
            .await
    }

    /// Lists a project's tasks, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskTriageError::Repository`] when the lookup fails.
    pub async fn list_by_project(
        &self,
        project_id: ProjectId,
        status: Option<DerivedTaskStatus>,
    ) -> DerivedTaskTriageResult<Vec<DerivedTask>> {
        Ok(self.repository.list_by_project(project_id, status).await?)
    }

    async fn transition<F>(
        &self,
        id: DerivedTaskId,
        apply: F,
    ) -> DerivedTaskTriageResult<DerivedTask>
    where
        F: FnOnce(&mut DerivedTask, &dyn Clock) -> Result<(), DiscoveryDomainError>,
    {
        let mut task = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(DerivedTaskTriageError::NotFound(id))?;
        let prior = task.status();
        apply(&mut task, &*self.clock)?;

        match self.repository.update_transition(&task, prior).await {
            Ok(()) => Ok(task),
            // Someone else transitioned the row first; report what blocks us.
            Err(DerivedTaskRepositoryError::StateConflict { found }) => Err(
                DiscoveryDomainError::InvalidTransition {
                    from: found.to_string(),
                    to: task.status().to_string(),
                }
                .into(),
            ),
            Err(DerivedTaskRepositoryError::NotFound(missing)) => {
                Err(DerivedTaskTriageError::NotFound(missing))
            }
            Err(err) => Err(err.into()),
        }
    }
}
