//! Repository port for channel connection persistence.

use crate::channel::domain::{ChannelConnection, ChannelId, ConnectionId, ProjectId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for connection repository operations.
pub type ConnectionRepositoryResult<T> = Result<T, ConnectionRepositoryError>;

/// Channel connection persistence contract.
///
/// Connections are unique per `(project_id, channel_id)` pair.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Stores a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionRepositoryError::DuplicatePair`] when a connection
    /// for the same `(project_id, channel_id)` pair already exists.
    async fn store(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()>;

    /// Persists changes to an existing connection (name, active flag,
    /// interval, watermark, sync health).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionRepositoryError::NotFound`] when the connection
    /// does not exist.
    async fn update(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()>;

    /// Finds the connection for a `(project_id, channel_id)` pair.
    ///
    /// Returns `None` when the pair was never connected.
    async fn find_by_pair(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> ConnectionRepositoryResult<Option<ChannelConnection>>;

    /// Returns all connections for a project, including inactive ones.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> ConnectionRepositoryResult<Vec<ChannelConnection>>;

    /// Returns all active connections across every project.
    async fn list_active(&self) -> ConnectionRepositoryResult<Vec<ChannelConnection>>;
}

/// Errors returned by connection repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ConnectionRepositoryError {
    /// A connection for the pair already exists.
    #[error("connection already exists for project {project_id} and channel {channel_id}")]
    DuplicatePair {
        /// Project side of the duplicate pair.
        project_id: ProjectId,
        /// Channel side of the duplicate pair.
        channel_id: ChannelId,
    },

    /// The connection was not found.
    #[error("connection not found: {0}")]
    NotFound(ConnectionId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConnectionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
