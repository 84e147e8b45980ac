//! The sync cycle: fetch, persist, analyse, advance the watermark.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;

use crate::channel::{
    domain::{ChannelConnection, ChannelId, ProjectId},
    ports::{ChannelApi, ChannelApiError, ConnectionRepository, ConnectionRepositoryError},
};
use crate::discovery::{
    ports::{AnalysisEngine, DerivedTaskRepository, ProjectDirectory},
    services::TaskDiscoveryService,
};
use crate::message::{
    domain::MessageRecord,
    ports::{MessageRepository, MessageRepositoryError},
};
use crate::sync::{
    breaker::RateLimitBreaker,
    outcome::{ChannelSyncHealth, SyncCycleOutcome, SyncCycleStatus},
    settings::SyncSettings,
};

/// Largest number of history pages fetched in one cycle.
const MAX_FETCH_PAGES: usize = 100;

/// Errors that abort a sync cycle outright.
///
/// Upstream fetch and analysis failures do not land here; they are
/// recorded on the connection and reported through the cycle outcome.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The pair has never been connected.
    #[error("project {project_id} is not connected to channel {channel_id}")]
    NotConnected {
        /// Project side of the missing pair.
        project_id: ProjectId,
        /// Channel side of the missing pair.
        channel_id: ChannelId,
    },

    /// The connection exists but was disconnected.
    #[error("connection for channel {channel_id} is inactive")]
    InactiveConnection {
        /// Channel of the inactive connection.
        channel_id: ChannelId,
    },

    /// A spawned cycle stopped before reporting an outcome.
    #[error("sync cycle task stopped early: {0}")]
    TaskStopped(String),

    /// Connection metadata could not be loaded or saved.
    #[error(transparent)]
    Connections(#[from] ConnectionRepositoryError),

    /// Fetched messages could not be read back.
    #[error(transparent)]
    Messages(#[from] MessageRepositoryError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Runs incremental sync cycles for connected channels.
///
/// A cycle fetches everything newer than the connection's watermark,
/// persists it, hands eligible messages to the discovery pipeline, and
/// only then advances the watermark. Any failure before that last step
/// leaves the watermark untouched, so the next cycle re-covers the same
/// ground.
pub struct SyncOrchestrator<R, M, A, D, E, P, C>
where
    R: ConnectionRepository,
    M: MessageRepository,
    A: ChannelApi,
    D: DerivedTaskRepository,
    E: AnalysisEngine,
    P: ProjectDirectory,
    C: Clock + Send + Sync,
{
    connections: Arc<R>,
    messages: Arc<M>,
    channel_api: Arc<A>,
    discovery: TaskDiscoveryService<D, E, P, C>,
    breaker: RateLimitBreaker<C>,
    in_flight: Mutex<HashSet<(ProjectId, ChannelId)>>,
    clock: Arc<C>,
    settings: SyncSettings,
}

struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<(ProjectId, ChannelId)>>,
    key: (ProjectId, ChannelId),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(&self.key);
    }
}

impl<R, M, A, D, E, P, C> SyncOrchestrator<R, M, A, D, E, P, C>
where
    R: ConnectionRepository,
    M: MessageRepository,
    A: ChannelApi,
    D: DerivedTaskRepository,
    E: AnalysisEngine,
    P: ProjectDirectory,
    C: Clock + Send + Sync,
{
    /// Wires an orchestrator from its collaborators and settings.
    ///
    /// The discovery pipeline and breaker are configured from `settings`,
    /// so batch cap, confidence floor, and cooldown stay consistent across
    /// a deployment.
    #[must_use]
    pub fn new(
        connections: Arc<R>,
        messages: Arc<M>,
        channel_api: Arc<A>,
        derived_tasks: Arc<D>,
        engine: Arc<E>,
        projects: Arc<P>,
        clock: Arc<C>,
        settings: SyncSettings,
    ) -> Self {
        let discovery =
            TaskDiscoveryService::new(derived_tasks, engine, projects, Arc::clone(&clock))
                .with_batch_cap(settings.batch_cap)
                .with_confidence_floor(settings.confidence_floor);
        let breaker = RateLimitBreaker::new(Arc::clone(&clock), settings.throttle_cooldown);
        Self {
            connections,
            messages,
            channel_api,
            discovery,
            breaker,
            in_flight: Mutex::new(HashSet::new()),
            clock,
            settings,
        }
    }

    /// Runs one sync cycle for a project/channel pair.
    ///
    /// At most one cycle per pair runs at a time; a second caller gets a
    /// skipped outcome instead of blocking. A throttled fetch opens the
    /// breaker, and while it is open cycles are skipped without touching
    /// the upstream.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConnected`] or
    /// [`SyncError::InactiveConnection`] for a pair that cannot sync, and
    /// repository errors when connection metadata cannot be loaded or
    /// saved. Fetch, persistence, and analysis failures are reported via
    /// [`SyncCycleStatus`] instead.
    pub async fn run_cycle(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> SyncResult<SyncCycleOutcome> {
        let Some(_guard) = self.try_begin(project_id, channel_id) else {
            return Ok(SyncCycleOutcome::empty(
                project_id,
                channel_id.clone(),
                SyncCycleStatus::SkippedInFlight,
            ));
        };
        if self.breaker.is_open(channel_id) {
            return Ok(SyncCycleOutcome::empty(
                project_id,
                channel_id.clone(),
                SyncCycleStatus::SkippedCircuitOpen,
            ));
        }

        let mut connection = self.require_active(project_id, channel_id).await?;
        let watermark = connection.last_analysis_watermark();

        let fetched = match self.fetch_history(channel_id, watermark).await {
            Ok(fetched) => fetched,
            Err(ChannelApiError::Throttled { retry_after }) => {
                self.breaker.record_throttled(channel_id, retry_after);
                let outcome = SyncCycleOutcome::empty(
                    project_id,
                    channel_id.clone(),
                    SyncCycleStatus::Throttled,
                );
                return self
                    .finish_failed(connection, "upstream throttled the fetch", outcome)
                    .await;
            }
            Err(ChannelApiError::Failed(reason)) => {
                let outcome = SyncCycleOutcome::empty(
                    project_id,
                    channel_id.clone(),
                    SyncCycleStatus::FetchFailed(reason.clone()),
                );
                return self.finish_failed(connection, &reason, outcome).await;
            }
        };

        if let Err(err) = self.messages.upsert_batch(&fetched).await {
            let reason = err.to_string();
            let outcome = SyncCycleOutcome {
                project_id,
                channel_id: channel_id.clone(),
                status: SyncCycleStatus::PersistFailed(reason.clone()),
                messages_fetched: fetched.len(),
                messages_analyzed: 0,
                tasks_discovered: 0,
            };
            return self.finish_failed(connection, &reason, outcome).await;
        }

        let eligible: Vec<MessageRecord> = fetched
            .iter()
            .filter(|record| record.is_eligible_for_analysis(watermark))
            .cloned()
            .collect();

        let tasks_discovered = match self
            .discovery
            .discover(project_id, channel_id, connection.channel_name(), &eligible)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                let reason = err.to_string();
                let outcome = SyncCycleOutcome {
                    project_id,
                    channel_id: channel_id.clone(),
                    status: SyncCycleStatus::AnalysisFailed(reason.clone()),
                    messages_fetched: fetched.len(),
                    messages_analyzed: eligible.len(),
                    tasks_discovered: 0,
                };
                return self.finish_failed(connection, &reason, outcome).await;
            }
        };

        if let Some(newest) = fetched.iter().map(MessageRecord::source_timestamp).max() {
            connection.advance_watermark(newest);
        }
        connection.record_sync_success(&*self.clock);
        self.connections.update(&connection).await?;

        Ok(SyncCycleOutcome {
            project_id,
            channel_id: channel_id.clone(),
            status: SyncCycleStatus::Completed,
            messages_fetched: fetched.len(),
            messages_analyzed: eligible.len(),
            tasks_discovered,
        })
    }

    /// Clears the analysis watermark and runs a fresh cycle over full
    /// history. Message rows are untouched; evidence-level dedup in the
    /// discovery pipeline keeps the rescan from duplicating suggestions.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConnected`] when the pair was never
    /// connected, plus everything [`Self::run_cycle`] can return.
    pub async fn force_reanalysis(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> SyncResult<SyncCycleOutcome> {
        let mut connection = self.require_connection(project_id, channel_id).await?;
        connection.clear_watermark();
        self.connections.update(&connection).await?;
        self.run_cycle(project_id, channel_id).await
    }

    /// Reports sync health for a pair: connection metadata plus the live
    /// breaker state for its channel.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConnected`] when the pair was never
    /// connected.
    pub async fn sync_health(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> SyncResult<ChannelSyncHealth> {
        let connection = self.require_connection(project_id, channel_id).await?;
        Ok(ChannelSyncHealth {
            snapshot: connection.health(),
            circuit_open: self.breaker.is_open(channel_id),
        })
    }

    /// Returns every active connection whose cadence says it is due now.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the listing fails.
    pub async fn due_connections(&self) -> SyncResult<Vec<ChannelConnection>> {
        let now = self.clock.utc();
        let active = self.connections.list_active().await?;
        Ok(active
            .into_iter()
            .filter(|connection| connection.is_due(now))
            .collect())
    }

    fn try_begin(&self, project_id: ProjectId, channel_id: &ChannelId) -> Option<InFlightGuard<'_>> {
        let key = (project_id, channel_id.clone());
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            key,
        })
    }

    async fn require_connection(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> SyncResult<ChannelConnection> {
        self.connections
            .find_by_pair(project_id, channel_id)
            .await?
            .ok_or(SyncError::NotConnected {
                project_id,
                channel_id: channel_id.clone(),
            })
    }

    async fn require_active(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
    ) -> SyncResult<ChannelConnection> {
        let connection = self.require_connection(project_id, channel_id).await?;
        if !connection.is_active() {
            return Err(SyncError::InactiveConnection {
                channel_id: channel_id.clone(),
            });
        }
        Ok(connection)
    }

    /// Fetches pages until the upstream stops returning a cursor.
    ///
    /// The loop is bounded: at most [`MAX_FETCH_PAGES`] calls per cycle,
    /// and a cursor seen before ends the fetch, since an upstream handing
    /// the same cursor back would otherwise loop forever. Either guard
    /// finishes the cycle with the pages gathered so far.
    async fn fetch_history(
        &self,
        channel_id: &ChannelId,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageRecord>, ChannelApiError> {
        let mut fetched = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_cursors: HashSet<String> = HashSet::new();
        for _ in 0..MAX_FETCH_PAGES {
            let page = self
                .channel_api
                .fetch_page(
                    channel_id,
                    watermark,
                    page_token.as_deref(),
                    self.settings.page_limit,
                )
                .await?;
            fetched.extend(page.messages);
            let Some(cursor) = page.next_page_token else {
                break;
            };
            if !seen_cursors.insert(cursor.clone()) {
                break;
            }
            page_token = Some(cursor);
        }
        Ok(fetched)
    }

    async fn finish_failed(
        &self,
        mut connection: ChannelConnection,
        reason: &str,
        outcome: SyncCycleOutcome,
    ) -> SyncResult<SyncCycleOutcome> {
        connection.record_sync_error(reason, &*self.clock);
        self.connections.update(&connection).await?;
        Ok(outcome)
    }
}
