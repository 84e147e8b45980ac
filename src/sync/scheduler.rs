//! Background scheduling of sync cycles.

use std::sync::Arc;

use mockable::Clock;
use tokio::task::{JoinHandle, JoinSet};

use crate::channel::{
    domain::{ChannelId, ProjectId},
    ports::{ChannelApi, ConnectionRepository, SyncTrigger},
};
use crate::discovery::ports::{AnalysisEngine, DerivedTaskRepository, ProjectDirectory};
use crate::message::ports::MessageRepository;
use crate::sync::{
    orchestrator::{SyncError, SyncOrchestrator, SyncResult},
    outcome::SyncCycleOutcome,
};

/// Fans sync cycles out onto the runtime.
///
/// Holds the orchestrator behind an `Arc` so spawned cycles share its
/// in-flight set and breaker. Doubles as the [`SyncTrigger`] handed to the
/// connection service for fire-and-forget initial cycles.
pub struct SyncScheduler<R, M, A, D, E, P, C>
where
    R: ConnectionRepository + 'static,
    M: MessageRepository + 'static,
    A: ChannelApi + 'static,
    D: DerivedTaskRepository + 'static,
    E: AnalysisEngine + 'static,
    P: ProjectDirectory + 'static,
    C: Clock + Send + Sync + 'static,
{
    orchestrator: Arc<SyncOrchestrator<R, M, A, D, E, P, C>>,
}

impl<R, M, A, D, E, P, C> Clone for SyncScheduler<R, M, A, D, E, P, C>
where
    R: ConnectionRepository + 'static,
    M: MessageRepository + 'static,
    A: ChannelApi + 'static,
    D: DerivedTaskRepository + 'static,
    E: AnalysisEngine + 'static,
    P: ProjectDirectory + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<R, M, A, D, E, P, C> SyncScheduler<R, M, A, D, E, P, C>
where
    R: ConnectionRepository + 'static,
    M: MessageRepository + 'static,
    A: ChannelApi + 'static,
    D: DerivedTaskRepository + 'static,
    E: AnalysisEngine + 'static,
    P: ProjectDirectory + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler over a shared orchestrator.
    #[must_use]
    pub const fn new(orchestrator: Arc<SyncOrchestrator<R, M, A, D, E, P, C>>) -> Self {
        Self { orchestrator }
    }

    /// Spawns one sync cycle and returns its handle.
    ///
    /// The caller may await the handle or drop it; the cycle runs either
    /// way.
    pub fn spawn_cycle(
        &self,
        project_id: ProjectId,
        channel_id: ChannelId,
    ) -> JoinHandle<SyncResult<SyncCycleOutcome>> {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move { orchestrator.run_cycle(project_id, &channel_id).await })
    }

    /// Runs a cycle for every connection that is due, concurrently.
    ///
    /// Every due pair yields one entry: an outcome, or the `SyncError`
    /// that aborted its cycle (missing or inactive connection, repository
    /// failures), so a broken store does not masquerade as an idle fleet.
    /// The in-flight set still holds, so a pair already syncing is skipped
    /// rather than doubled up.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the due-connection listing fails.
    /// Per-cycle failures come back inside the result vector instead.
    pub async fn sync_all_due(&self) -> SyncResult<Vec<SyncResult<SyncCycleOutcome>>> {
        let due = self.orchestrator.due_connections().await?;

        let mut cycles = JoinSet::new();
        for connection in due {
            let orchestrator = Arc::clone(&self.orchestrator);
            cycles.spawn(async move {
                orchestrator
                    .run_cycle(connection.project_id(), connection.channel_id())
                    .await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = cycles.join_next().await {
            results.push(
                joined.unwrap_or_else(|err| Err(SyncError::TaskStopped(err.to_string()))),
            );
        }
        Ok(results)
    }
}

impl<R, M, A, D, E, P, C> SyncTrigger for SyncScheduler<R, M, A, D, E, P, C>
where
    R: ConnectionRepository + 'static,
    M: MessageRepository + 'static,
    A: ChannelApi + 'static,
    D: DerivedTaskRepository + 'static,
    E: AnalysisEngine + 'static,
    P: ProjectDirectory + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn trigger(&self, project_id: ProjectId, channel_id: &ChannelId) {
        drop(self.spawn_cycle(project_id, channel_id.clone()));
    }
}
