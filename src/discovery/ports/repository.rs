//! Persistence port for derived tasks.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::domain::ProjectId;
use crate::discovery::domain::{DerivedTask, DerivedTaskId, DerivedTaskStatus};
use crate::message::domain::MessageId;

/// Result type for derived-task repository operations.
pub type DerivedTaskRepositoryResult<T> = Result<T, DerivedTaskRepositoryError>;

/// Errors surfaced by derived-task persistence.
#[derive(Debug, Clone, Error)]
pub enum DerivedTaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("derived task {0} already exists")]
    DuplicateTask(DerivedTaskId),

    /// A task derived from the same source message already exists.
    #[error("a derived task already exists for source message {0}")]
    DuplicateEvidence(MessageId),

    /// No task with the given identifier exists.
    #[error("derived task {0} not found")]
    NotFound(DerivedTaskId),

    /// The stored status no longer matches the expected prior status.
    #[error("derived task status changed concurrently, found '{found}'")]
    StateConflict {
        /// Status found in the store.
        found: DerivedTaskStatus,
    },

    /// The underlying store failed.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DerivedTaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Store of derived tasks keyed by identifier and source message.
#[async_trait]
pub trait DerivedTaskRepository: Send + Sync {
    /// Stores a fresh suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::DuplicateTask`] when the
    /// identifier is taken, [`DerivedTaskRepositoryError::DuplicateEvidence`]
    /// when another task already cites the same source message, or
    /// [`DerivedTaskRepositoryError::Persistence`] when the store fails.
    async fn store(&self, task: &DerivedTask) -> DerivedTaskRepositoryResult<()>;

    /// Loads a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::Persistence`] when the store
    /// fails.
    async fn find_by_id(
        &self,
        id: DerivedTaskId,
    ) -> DerivedTaskRepositoryResult<Option<DerivedTask>>;

    /// Returns true when any task cites the given source message.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::Persistence`] when the store
    /// fails.
    async fn exists_for_source(
        &self,
        source_message_id: &MessageId,
    ) -> DerivedTaskRepositoryResult<bool>;

    /// Lists a project's tasks, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::Persistence`] when the store
    /// fails.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
        status: Option<DerivedTaskStatus>,
    ) -> DerivedTaskRepositoryResult<Vec<DerivedTask>>;

    /// Persists a lifecycle transition, succeeding only when the stored
    /// status still equals `expected_prior`.
    ///
    /// # Errors
    ///
    /// Returns [`DerivedTaskRepositoryError::NotFound`] when the task is
    /// missing, [`DerivedTaskRepositoryError::StateConflict`] when the
    /// stored status differs from `expected_prior`, or
    /// [`DerivedTaskRepositoryError::Persistence`] when the store fails.
    async fn update_transition(
        &self,
        task: &DerivedTask,
        expected_prior: DerivedTaskStatus,
    ) -> DerivedTaskRepositoryResult<()>;
}
