//! `PostgreSQL` repository implementation for channel connections.

use super::{
    models::{ConnectionRow, NewConnectionRow},
    schema::connections,
};
use crate::channel::{
    domain::{
        ChannelConnection, ChannelId, ChannelName, ConnectionId, PersistedConnectionData,
        ProjectId, SyncInterval,
    },
    ports::{ConnectionRepository, ConnectionRepositoryError, ConnectionRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by channel adapters.
pub type ConnectionPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed connection repository.
#[derive(Debug, Clone)]
pub struct PostgresConnectionRepository {
    pool: ConnectionPgPool,
}

impl PostgresConnectionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ConnectionPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ConnectionRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ConnectionRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(ConnectionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ConnectionRepositoryError::persistence)?
    }
}

#[async_trait]
impl ConnectionRepository for PostgresConnectionRepository {
    async fn store(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        let project_id = connection.project_id();
        let channel_id = connection.channel_id().clone();
        let new_row = to_new_row(connection);

        self.run_blocking(move |db| {
            diesel::insert_into(connections::table)
                .values(&new_row)
                .execute(db)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ConnectionRepositoryError::DuplicatePair {
                            project_id,
                            channel_id: channel_id.clone(),
                        }
                    }
                    _ => ConnectionRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        let id = connection.id();
        let changed_row = to_new_row(connection);

        self.run_blocking(move |db| {
            let updated = diesel::update(connections::table.filter(connections::id.eq(id.into_inner())))
                .set(&changed_row)
                .execute(db)
                .map_err(ConnectionRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ConnectionRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_pair(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> ConnectionRepositoryResult<Option<ChannelConnection>> {
        let channel_lookup = channel_id.as_str().to_owned();
        self.run_blocking(move |db| {
            let row = connections::table
                .filter(connections::project_id.eq(project_id.into_inner()))
                .filter(connections::channel_id.eq(&channel_lookup))
                .select(ConnectionRow::as_select())
                .first::<ConnectionRow>(db)
                .optional()
                .map_err(ConnectionRepositoryError::persistence)?;
            row.map(row_to_connection).transpose()
        })
        .await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        self.run_blocking(move |db| {
            let rows = connections::table
                .filter(connections::project_id.eq(project_id.into_inner()))
                .order(connections::connected_at.asc())
                .select(ConnectionRow::as_select())
                .load::<ConnectionRow>(db)
                .map_err(ConnectionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_connection).collect()
        })
        .await
    }

    async fn list_active(&self) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        self.run_blocking(move |db| {
            let rows = connections::table
                .filter(connections::is_active.eq(true))
                .order(connections::connected_at.asc())
                .select(ConnectionRow::as_select())
                .load::<ConnectionRow>(db)
                .map_err(ConnectionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_connection).collect()
        })
        .await
    }
}

fn to_new_row(connection: &ChannelConnection) -> NewConnectionRow {
    NewConnectionRow {
        id: connection.id().into_inner(),
        project_id: connection.project_id().into_inner(),
        channel_id: connection.channel_id().as_str().to_owned(),
        channel_name: connection.channel_name().as_str().to_owned(),
        connected_at: connection.connected_at(),
        is_active: connection.is_active(),
        sync_interval_minutes: i32::try_from(connection.sync_interval().minutes())
            .unwrap_or(i32::MAX),
        last_analysis_watermark: connection.last_analysis_watermark(),
        last_sync_at: connection.last_sync_at(),
        last_error: connection.last_error().map(str::to_owned),
    }
}

fn row_to_connection(row: ConnectionRow) -> ConnectionRepositoryResult<ChannelConnection> {
    let channel_id =
        ChannelId::new(row.channel_id).map_err(ConnectionRepositoryError::persistence)?;
    let channel_name =
        ChannelName::new(row.channel_name).map_err(ConnectionRepositoryError::persistence)?;
    let minutes =
        u32::try_from(row.sync_interval_minutes).map_err(ConnectionRepositoryError::persistence)?;
    let sync_interval =
        SyncInterval::from_minutes(minutes).map_err(ConnectionRepositoryError::persistence)?;

    let data = PersistedConnectionData {
        id: ConnectionId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        channel_id,
        channel_name,
        connected_at: row.connected_at,
        is_active: row.is_active,
        sync_interval,
        last_analysis_watermark: row.last_analysis_watermark,
        last_sync_at: row.last_sync_at,
        last_error: row.last_error,
    };
    Ok(ChannelConnection::from_persisted(data))
}
