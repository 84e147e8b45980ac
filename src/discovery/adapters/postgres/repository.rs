//! `PostgreSQL` repository implementation for derived tasks.

use super::{
    models::{DerivedTaskRow, DerivedTaskTransitionChangeset, NewDerivedTaskRow},
    schema::derived_tasks,
};
use crate::channel::domain::{ChannelId, ProjectId};
use crate::discovery::{
    domain::{
        ConfidenceScore, DerivedTask, DerivedTaskId, DerivedTaskStatus, PersistedDerivedTaskData,
        WorkspaceTaskId,
    },
    ports::{DerivedTaskRepository, DerivedTaskRepositoryError, DerivedTaskRepositoryResult},
};
use crate::message::domain::MessageId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by discovery adapters.
pub type DerivedTaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed derived-task repository.
///
/// Relies on a unique index over `source_message_id` for evidence
/// deduplication and a conditional update for transition atomicity.
#[derive(Debug, Clone)]
pub struct PostgresDerivedTaskRepository {
    pool: DerivedTaskPgPool,
}

impl PostgresDerivedTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DerivedTaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DerivedTaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DerivedTaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(DerivedTaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(DerivedTaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl DerivedTaskRepository for PostgresDerivedTaskRepository {
    async fn store(&self, task: &DerivedTask) -> DerivedTaskRepositoryResult<()> {
        let id = task.id();
        let source_message_id = task.source_message_id().clone();
        let new_row = to_new_row(task);

        self.run_blocking(move |db| {
            diesel::insert_into(derived_tasks::table)
                .values(&new_row)
                .execute(db)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                        if info.constraint_name() == Some("derived_tasks_pkey") {
                            DerivedTaskRepositoryError::DuplicateTask(id)
                        } else {
                            DerivedTaskRepositoryError::DuplicateEvidence(
                                source_message_id.clone(),
                            )
                        }
                    }
                    _ => DerivedTaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: DerivedTaskId,
    ) -> DerivedTaskRepositoryResult<Option<DerivedTask>> {
        self.run_blocking(move |db| {
            let row = derived_tasks::table
                .find(id.into_inner())
                .select(DerivedTaskRow::as_select())
                .first::<DerivedTaskRow>(db)
                .optional()
                .map_err(DerivedTaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn exists_for_source(
        &self,
        source_message_id: &MessageId,
    ) -> DerivedTaskRepositoryResult<bool> {
        let lookup = source_message_id.as_str().to_owned();
        self.run_blocking(move |db| {
            let found = diesel::select(diesel::dsl::exists(
                derived_tasks::table.filter(derived_tasks::source_message_id.eq(&lookup)),
            ))
            .get_result::<bool>(db)
            .map_err(DerivedTaskRepositoryError::persistence)?;
            Ok(found)
        })
        .await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
        status: Option<DerivedTaskStatus>,
    ) -> DerivedTaskRepositoryResult<Vec<DerivedTask>> {
        self.run_blocking(move |db| {
            let mut query = derived_tasks::table
                .filter(derived_tasks::project_id.eq(project_id.into_inner()))
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(derived_tasks::status.eq(wanted.as_str()));
            }
            let rows = query
                .order(derived_tasks::created_at.desc())
                .select(DerivedTaskRow::as_select())
                .load::<DerivedTaskRow>(db)
                .map_err(DerivedTaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn update_transition(
        &self,
        task: &DerivedTask,
        expected_prior: DerivedTaskStatus,
    ) -> DerivedTaskRepositoryResult<()> {
        let id = task.id();
        let changeset = DerivedTaskTransitionChangeset {
            status: task.status().as_str().to_owned(),
            created_task_id: task.created_task_id().map(WorkspaceTaskId::into_inner),
            updated_at: task.updated_at(),
        };

        self.run_blocking(move |db| {
            let updated = diesel::update(
                derived_tasks::table
                    .filter(derived_tasks::id.eq(id.into_inner()))
                    .filter(derived_tasks::status.eq(expected_prior.as_str())),
            )
            .set(&changeset)
            .execute(db)
            .map_err(DerivedTaskRepositoryError::persistence)?;
            if updated == 1 {
                return Ok(());
            }

            // Distinguish a vanished row from a concurrent transition.
            let found = derived_tasks::table
                .find(id.into_inner())
                .select(derived_tasks::status)
                .first::<String>(db)
                .optional()
                .map_err(DerivedTaskRepositoryError::persistence)?;
            match found {
                None => Err(DerivedTaskRepositoryError::NotFound(id)),
                Some(stored) => {
                    let status = DerivedTaskStatus::try_from(stored.as_str())
                        .map_err(DerivedTaskRepositoryError::persistence)?;
                    Err(DerivedTaskRepositoryError::StateConflict { found: status })
                }
            }
        })
        .await
    }
}

fn to_new_row(task: &DerivedTask) -> NewDerivedTaskRow {
    NewDerivedTaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        channel_id: task.channel_id().as_str().to_owned(),
        source_message_id: task.source_message_id().as_str().to_owned(),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        confidence_score: task.confidence().value(),
        status: task.status().as_str().to_owned(),
        created_task_id: task.created_task_id().map(WorkspaceTaskId::into_inner),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: DerivedTaskRow) -> DerivedTaskRepositoryResult<DerivedTask> {
    let channel_id =
        ChannelId::new(row.channel_id).map_err(DerivedTaskRepositoryError::persistence)?;
    let source_message_id =
        MessageId::new(row.source_message_id).map_err(DerivedTaskRepositoryError::persistence)?;
    let confidence = ConfidenceScore::new(row.confidence_score)
        .map_err(DerivedTaskRepositoryError::persistence)?;
    let status = DerivedTaskStatus::try_from(row.status.as_str())
        .map_err(DerivedTaskRepositoryError::persistence)?;

    let data = PersistedDerivedTaskData {
        id: DerivedTaskId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        channel_id,
        source_message_id,
        title: row.title,
        description: row.description,
        confidence,
        status,
        created_task_id: row.created_task_id.map(WorkspaceTaskId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(DerivedTask::from_persisted(data))
}
