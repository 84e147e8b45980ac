//! Service layer for channel connection lifecycle.

use crate::channel::{
    domain::{
        ChannelConnection, ChannelDomainError, ChannelId, ChannelName, ConnectionId, ProjectId,
        SyncInterval,
    },
    ports::{
        ChannelApi, ChannelApiError, ConnectionRepository, ConnectionRepositoryError, SyncTrigger,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for connecting a project to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectChannelRequest {
    project_id: ProjectId,
    channel_id: String,
    channel_name: String,
    verify_access: bool,
    sync_interval_minutes: Option<u32>,
}

impl ConnectChannelRequest {
    /// Creates a request with required fields; access is verified by default.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        channel_id: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            channel_id: channel_id.into(),
            channel_name: channel_name.into(),
            verify_access: true,
            sync_interval_minutes: None,
        }
    }

    /// Skips the read-access probe.
    #[must_use]
    pub const fn without_access_check(mut self) -> Self {
        self.verify_access = false;
        self
    }

    /// Sets a non-default sync interval in minutes.
    #[must_use]
    pub const fn with_sync_interval_minutes(mut self, minutes: u32) -> Self {
        self.sync_interval_minutes = Some(minutes);
        self
    }
}

/// Service-level errors for connection lifecycle operations.
#[derive(Debug, Error)]
pub enum ChannelConnectionError {
    /// The access probe failed; user-correctable by granting access.
    #[error("no read access to channel {channel_id}")]
    NoAccess {
        /// Channel the probe was rejected for.
        channel_id: ChannelId,
    },

    /// The pair has never been connected.
    #[error("project {project_id} is not connected to channel {channel_id}")]
    NotConnected {
        /// Project side of the missing pair.
        project_id: ProjectId,
        /// Channel side of the missing pair.
        channel_id: ChannelId,
    },

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ChannelDomainError),

    /// The channel API probe request failed.
    #[error(transparent)]
    Api(#[from] ChannelApiError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ConnectionRepositoryError),
}

/// Result type for connection service operations.
pub type ChannelConnectionResult<T> = Result<T, ChannelConnectionError>;

/// Connection lifecycle orchestration service.
///
/// The only path by which a connection comes into existence.
#[derive(Clone)]
pub struct ChannelConnectionService<R, A, T, C>
where
    R: ConnectionRepository,
    A: ChannelApi,
    T: SyncTrigger,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    channel_api: Arc<A>,
    sync_trigger: Arc<T>,
    clock: Arc<C>,
}

impl<R, A, T, C> ChannelConnectionService<R, A, T, C>
where
    R: ConnectionRepository,
    A: ChannelApi,
    T: SyncTrigger,
    C: Clock + Send + Sync,
{
    /// Creates a new connection service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        channel_api: Arc<A>,
        sync_trigger: Arc<T>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            channel_api,
            sync_trigger,
            clock,
        }
    }

    /// Connects a project to a channel, idempotently.
    ///
    /// Connecting an already-connected pair refreshes metadata without
    /// creating a duplicate row or disturbing the watermark. A successful
    /// connect fires an initial sync cycle through the trigger port; that
    /// cycle's failure never rolls the connection back.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConnectionError::NoAccess`] when the access probe is
    /// rejected, domain errors for invalid input, or repository errors when
    /// persistence fails.
    pub async fn connect(
        &self,
        request: ConnectChannelRequest,
    ) -> ChannelConnectionResult<ConnectionId> {
        let channel_id = ChannelId::new(request.channel_id)?;
        let channel_name = ChannelName::new(request.channel_name)?;
        let sync_interval = request
            .sync_interval_minutes
            .map_or(Ok(SyncInterval::default()), SyncInterval::from_minutes)?;

        if request.verify_access && !self.channel_api.probe_access(&channel_id).await? {
            return Err(ChannelConnectionError::NoAccess { channel_id });
        }

        let existing = self
            .repository
            .find_by_pair(request.project_id, &channel_id)
            .await?;

        let connection_id = match existing {
            Some(mut connection) => {
                connection.reconnect(channel_name);
                connection.set_sync_interval(sync_interval);
                self.repository.update(&connection).await?;
                connection.id()
            }
            None => {
                let connection = ChannelConnection::new(
                    request.project_id,
                    channel_id.clone(),
                    channel_name,
                    sync_interval,
                    &*self.clock,
                );
                self.repository.store(&connection).await?;
                connection.id()
            }
        };

        self.sync_trigger.trigger(request.project_id, &channel_id);
        Ok(connection_id)
    }

    /// Disconnects a project from a channel.
    ///
    /// Soft delete only: messages and derived tasks stay queryable.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConnectionError::NotConnected`] when the pair was
    /// never connected.
    pub async fn disconnect(
        &self,
        project_id: ProjectId,
        channel_id: &str,
    ) -> ChannelConnectionResult<()> {
        let mut connection = self.require_connection(project_id, channel_id).await?;
        connection.deactivate();
        self.repository.update(&connection).await?;
        Ok(())
    }

    /// Replaces the sync interval for a connected pair.
    ///
    /// Pure metadata update with no effect on in-flight cycles.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConnectionError::NotConnected`] when the pair was
    /// never connected, or a domain error for an out-of-range interval.
    pub async fn update_sync_frequency(
        &self,
        project_id: ProjectId,
        channel_id: &str,
        minutes: u32,
    ) -> ChannelConnectionResult<()> {
        let interval = SyncInterval::from_minutes(minutes)?;
        let mut connection = self.require_connection(project_id, channel_id).await?;
        connection.set_sync_interval(interval);
        self.repository.update(&connection).await?;
        Ok(())
    }

    /// Returns all connections for a project, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConnectionError::Repository`] when the lookup fails.
    pub async fn list_connections(
        &self,
        project_id: ProjectId,
    ) -> ChannelConnectionResult<Vec<ChannelConnection>> {
        Ok(self.repository.list_by_project(project_id).await?)
    }

    /// Returns every active connection across all projects.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelConnectionError::Repository`] when the lookup fails.
    pub async fn list_connected_channels(
        &self,
    ) -> ChannelConnectionResult<Vec<ChannelConnection>> {
        Ok(self.repository.list_active().await?)
    }

    async fn require_connection(
        &self,
        project_id: ProjectId,
        channel_id: &str,
    ) -> ChannelConnectionResult<ChannelConnection> {
        let validated = ChannelId::new(channel_id)?;
        self.repository
            .find_by_pair(project_id, &validated)
            .await?
            .ok_or(ChannelConnectionError::NotConnected {
                project_id,
                channel_id: validated,
            })
    }
}
