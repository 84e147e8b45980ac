//! Outcome reporting for sync cycles.

use crate::channel::domain::{ChannelId, ProjectId, SyncHealthSnapshot};

/// How a sync cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCycleStatus {
    /// The cycle ran to completion.
    Completed,
    /// Another cycle for the same pair was already in flight.
    SkippedInFlight,
    /// The rate-limit breaker was open for the channel.
    SkippedCircuitOpen,
    /// The upstream throttled the fetch; the breaker is now open.
    Throttled,
    /// The fetch failed for a reason other than throttling.
    FetchFailed(String),
    /// Fetched messages could not be persisted.
    PersistFailed(String),
    /// Messages were persisted but analysis failed; the watermark did not
    /// move, so the same messages are retried next cycle.
    AnalysisFailed(String),
}

impl SyncCycleStatus {
    /// Returns true when the cycle did not run at all.
    #[must_use]
    pub const fn was_skipped(&self) -> bool {
        matches!(self, Self::SkippedInFlight | Self::SkippedCircuitOpen)
    }
}

/// Summary of one sync cycle for one project/channel pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCycleOutcome {
    /// Project side of the synced pair.
    pub project_id: ProjectId,
    /// Channel side of the synced pair.
    pub channel_id: ChannelId,
    /// How the cycle ended.
    pub status: SyncCycleStatus,
    /// Messages fetched from the upstream API.
    pub messages_fetched: usize,
    /// Messages that passed the analysis eligibility filter.
    pub messages_analyzed: usize,
    /// Derived tasks stored by the discovery pipeline.
    pub tasks_discovered: usize,
}

impl SyncCycleOutcome {
    /// Creates an outcome with zeroed counters.
    #[must_use]
    pub const fn empty(project_id: ProjectId, channel_id: ChannelId, status: SyncCycleStatus) -> Self {
        Self {
            project_id,
            channel_id,
            status,
            messages_fetched: 0,
            messages_analyzed: 0,
            tasks_discovered: 0,
        }
    }
}

/// Sync health for one connected pair, breaker state included.
///
/// The snapshot comes from connection metadata; the circuit flag is live
/// breaker state and therefore only meaningful inside the process running
/// the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSyncHealth {
    /// Last sync time and last recorded error for the connection.
    pub snapshot: SyncHealthSnapshot,
    /// Whether the rate-limit breaker is currently open for the channel.
    pub circuit_open: bool,
}
