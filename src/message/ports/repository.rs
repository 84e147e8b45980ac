//! Repository port for message persistence.

use crate::channel::domain::ChannelId;
use crate::message::domain::{MessageId, MessageRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for message repository operations.
pub type MessageRepositoryResult<T> = Result<T, MessageRepositoryError>;

/// Message persistence contract.
///
/// Upserts are idempotent on the derived message identifier: re-persisting a
/// fetched message overwrites the existing row instead of duplicating it.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Upserts a single message record.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::Persistence`] when the write fails.
    async fn upsert(&self, record: &MessageRecord) -> MessageRepositoryResult<()>;

    /// Upserts a fetched page of messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::Persistence`] when any write fails.
    async fn upsert_batch(&self, records: &[MessageRecord]) -> MessageRepositoryResult<()>;

    /// Finds a message by identifier.
    ///
    /// Returns `None` when no message with the identifier exists.
    async fn find_by_id(&self, id: &MessageId) -> MessageRepositoryResult<Option<MessageRecord>>;

    /// Returns all stored messages for a channel, oldest first.
    async fn list_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> MessageRepositoryResult<Vec<MessageRecord>>;
}

/// Errors returned by message repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MessageRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MessageRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
