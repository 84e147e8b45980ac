//! `PostgreSQL` repository implementation for message storage.

use super::{
    models::{MessageRow, NewMessageRow},
    schema::messages,
};
use crate::channel::domain::ChannelId;
use crate::message::{
    domain::{MessageId, MessageKind, MessageRecord},
    ports::{MessageRepository, MessageRepositoryError, MessageRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by message adapters.
pub type MessagePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed message repository.
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
    pool: MessagePgPool,
}

impl PostgresMessageRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MessagePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MessageRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MessageRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(MessageRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MessageRepositoryError::persistence)?
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn upsert(&self, record: &MessageRecord) -> MessageRepositoryResult<()> {
        let incoming = record.clone();
        self.run_blocking(move |connection| upsert_row(connection, &incoming))
            .await
    }

    async fn upsert_batch(&self, records: &[MessageRecord]) -> MessageRepositoryResult<()> {
        let incoming: Vec<MessageRecord> = records.to_vec();
        self.run_blocking(move |connection| {
            for record in &incoming {
                upsert_row(connection, record)?;
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &MessageId) -> MessageRepositoryResult<Option<MessageRecord>> {
        let lookup = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = messages::table
                .filter(messages::id.eq(&lookup))
                .select(MessageRow::as_select())
                .first::<MessageRow>(connection)
                .optional()
                .map_err(MessageRepositoryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn list_by_channel(
        &self,
        channel_id: &ChannelId,
    ) -> MessageRepositoryResult<Vec<MessageRecord>> {
        let lookup = channel_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = messages::table
                .filter(messages::channel_id.eq(&lookup))
                .order(messages::source_timestamp.asc())
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(MessageRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn upsert_row(
    connection: &mut PgConnection,
    incoming: &MessageRecord,
) -> MessageRepositoryResult<()> {
    // Deleted rows are immutable except for the deleted flag, so a stored
    // copy has to be consulted before overwriting. The unique key still
    // guarantees a single row per message in the TOCTOU window.
    let stored = messages::table
        .filter(messages::id.eq(incoming.id().as_str()))
        .select(MessageRow::as_select())
        .first::<MessageRow>(connection)
        .optional()
        .map_err(MessageRepositoryError::persistence)?
        .map(row_to_record)
        .transpose()?;

    let merged = stored.map_or_else(
        || incoming.clone(),
        |existing| MessageRecord::merge_refetched(&existing, incoming.clone()),
    );
    let new_row = to_new_row(&merged);

    diesel::insert_into(messages::table)
        .values(&new_row)
        .on_conflict(messages::id)
        .do_update()
        .set(&new_row)
        .execute(connection)
        .map_err(MessageRepositoryError::persistence)?;
    Ok(())
}

fn to_new_row(record: &MessageRecord) -> NewMessageRow {
    NewMessageRow {
        id: record.id().as_str().to_owned(),
        channel_id: record.channel_id().as_str().to_owned(),
        text: record.text().to_owned(),
        author_id: record.author_id().to_owned(),
        kind: record.kind().as_str().to_owned(),
        source_timestamp: record.source_timestamp(),
        thread_id: record.thread_id().map(str::to_owned),
        is_edited: record.is_edited(),
        is_deleted: record.is_deleted(),
    }
}

fn row_to_record(row: MessageRow) -> MessageRepositoryResult<MessageRecord> {
    let channel_id =
        ChannelId::new(row.channel_id).map_err(MessageRepositoryError::persistence)?;
    let kind =
        MessageKind::try_from(row.kind.as_str()).map_err(MessageRepositoryError::persistence)?;

    let mut record = MessageRecord::new(
        channel_id,
        row.text,
        row.author_id,
        kind,
        row.source_timestamp,
    );
    if let Some(thread_id) = row.thread_id {
        record = record.with_thread_id(thread_id);
    }
    if row.is_edited {
        record = record.edited();
    }
    if row.is_deleted {
        record = record.deleted();
    }
    Ok(record)
}
