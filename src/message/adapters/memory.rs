//! In-memory message repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::channel::domain::ChannelId;
use crate::message::{
    domain::{MessageId, MessageRecord},
    ports::{MessageRepository, MessageRepositoryError, MessageRepositoryResult},
};

/// Thread-safe in-memory message repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    state: Arc<RwLock<HashMap<MessageId, MessageRecord>>>,
}

impl InMemoryMessageRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn len(&self) -> MessageRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.len())
    }

    /// Returns whether the repository holds no messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn is_empty(&self) -> MessageRepositoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> MessageRepositoryError {
    MessageRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn upsert_record(state: &mut HashMap<MessageId, MessageRecord>, record: &MessageRecord) {
    let merged = state.get(record.id()).map_or_else(
        || record.clone(),
        |stored| MessageRecord::merge_refetched(stored, record.clone()),
    );
    state.insert(record.id().clone(), merged);
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn upsert(&self, record: &MessageRecord) -> MessageRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        upsert_record(&mut state, record);
        Ok(())
    }

    async fn upsert_batch(&self, records: &[MessageRecord]) -> MessageRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        for record in records {
            upsert_record(&mut state, record);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &MessageId) -> MessageRepositoryResult<Option<MessageRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(id).cloned())
    }

    async fn list_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> MessageRepositoryResult<Vec<MessageRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut records: Vec<MessageRecord> = state
            .values()
            .filter(|record| record.channel_id() == channel_id)
            .cloned()
            .collect();
        records.sort_by_key(MessageRecord::source_timestamp);
        Ok(records)
    }
}
