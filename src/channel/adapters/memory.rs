//! In-memory connection repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::channel::{
    domain::{ChannelConnection, ChannelId, ConnectionId, ProjectId},
    ports::{ConnectionRepository, ConnectionRepositoryError, ConnectionRepositoryResult},
};

type PairKey = (ProjectId, ChannelId);

#[derive(Debug, Default)]
struct InMemoryConnectionState {
    connections: HashMap<ConnectionId, ChannelConnection>,
    pair_index: HashMap<PairKey, ConnectionId>,
}

/// Thread-safe in-memory connection repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectionRepository {
    state: Arc<RwLock<InMemoryConnectionState>>,
}

impl InMemoryConnectionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> ConnectionRepositoryError {
    ConnectionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn store(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let key = (connection.project_id(), connection.channel_id().clone());
        if state.pair_index.contains_key(&key) {
            return Err(ConnectionRepositoryError::DuplicatePair {
                project_id: connection.project_id(),
                channel_id: connection.channel_id().clone(),
            });
        }

        state.pair_index.insert(key, connection.id());
        state.connections.insert(connection.id(), connection.clone());
        Ok(())
    }

    async fn update(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.connections.contains_key(&connection.id()) {
            return Err(ConnectionRepositoryError::NotFound(connection.id()));
        }
        state.connections.insert(connection.id(), connection.clone());
        Ok(())
    }

    async fn find_by_pair(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> ConnectionRepositoryResult<Option<ChannelConnection>> {
        let state = self.state.read().map_err(lock_error)?;
        let key = (project_id, channel_id.clone());
        let connection = state
            .pair_index
            .get(&key)
            .and_then(|id| state.connections.get(id))
            .cloned();
        Ok(connection)
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut connections: Vec<ChannelConnection> = state
            .connections
            .values()
            .filter(|connection| connection.project_id() == project_id)
            .cloned()
            .collect();
        connections.sort_by_key(ChannelConnection::connected_at);
        Ok(connections)
    }

    async fn list_active(&self) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut connections: Vec<ChannelConnection> = state
            .connections
            .values()
            .filter(|connection| connection.is_active())
            .cloned()
            .collect();
        connections.sort_by_key(ChannelConnection::connected_at);
        Ok(connections)
    }
}
