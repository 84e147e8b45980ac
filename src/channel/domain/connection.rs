//! Channel connection aggregate root.

use super::{ChannelId, ChannelName, ConnectionId, ProjectId, SyncHealthSnapshot, SyncInterval};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Relationship between one project and one external channel.
///
/// The aggregate owns the analysis watermark: the timestamp up to which the
/// channel's messages have been successfully analysed. The watermark only
/// moves forward; the sole way to clear it is an explicit force-reanalysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConnection {
    id: ConnectionId,
    project_id: ProjectId,
    channel_id: ChannelId,
    channel_name: ChannelName,
    connected_at: DateTime<Utc>,
    is_active: bool,
    sync_interval: SyncInterval,
    last_analysis_watermark: Option<DateTime<Utc>>,
    last_sync_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Parameter object for reconstructing a persisted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConnectionData {
    /// Persisted connection identifier.
    pub id: ConnectionId,
    /// Persisted project identifier.
    pub project_id: ProjectId,
    /// Persisted channel identifier.
    pub channel_id: ChannelId,
    /// Persisted channel name.
    pub channel_name: ChannelName,
    /// Persisted connection timestamp.
    pub connected_at: DateTime<Utc>,
    /// Persisted active flag.
    pub is_active: bool,
    /// Persisted sync interval.
    pub sync_interval: SyncInterval,
    /// Persisted analysis watermark, if any.
    pub last_analysis_watermark: Option<DateTime<Utc>>,
    /// Persisted last sync attempt timestamp, if any.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Persisted last sync error, if any.
    pub last_error: Option<String>,
}

impl ChannelConnection {
    /// Creates a new active connection with no sync history.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        channel_id: ChannelId,
        channel_name: ChannelName,
        sync_interval: SyncInterval,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            project_id,
            channel_id,
            channel_name,
            connected_at: clock.utc(),
            is_active: true,
            sync_interval,
            last_analysis_watermark: None,
            last_sync_at: None,
            last_error: None,
        }
    }

    /// Reconstructs a connection from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedConnectionData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            channel_id: data.channel_id,
            channel_name: data.channel_name,
            connected_at: data.connected_at,
            is_active: data.is_active,
            sync_interval: data.sync_interval,
            last_analysis_watermark: data.last_analysis_watermark,
            last_sync_at: data.last_sync_at,
            last_error: data.last_error,
        }
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the channel identifier.
    #[must_use]
    pub const fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Returns the channel name.
    #[must_use]
    pub const fn channel_name(&self) -> &ChannelName {
        &self.channel_name
    }

    /// Returns the connection timestamp.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Returns whether the connection is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the configured sync interval.
    #[must_use]
    pub const fn sync_interval(&self) -> SyncInterval {
        self.sync_interval
    }

    /// Returns the analysis watermark, if any.
    #[must_use]
    pub const fn last_analysis_watermark(&self) -> Option<DateTime<Utc>> {
        self.last_analysis_watermark
    }

    /// Returns the time of the most recent sync attempt, if any.
    #[must_use]
    pub const fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    /// Returns the error recorded by the most recent failed cycle, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Refreshes metadata when an existing pair is connected again.
    ///
    /// Reconnecting never disturbs the watermark or sync history; it only
    /// updates the display name and reactivates the row.
    pub fn reconnect(&mut self, channel_name: ChannelName) {
        self.channel_name = channel_name;
        self.is_active = true;
    }

    /// Soft-deletes the connection.
    ///
    /// Messages and derived tasks referencing this channel remain queryable.
    pub const fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Replaces the sync interval. No effect on in-flight cycles.
    pub const fn set_sync_interval(&mut self, interval: SyncInterval) {
        self.sync_interval = interval;
    }

    /// Moves the analysis watermark forward to `timestamp`.
    ///
    /// The watermark is monotonically non-decreasing: a timestamp at or
    /// below the current value is a no-op, never a regression.
    pub fn advance_watermark(&mut self, timestamp: DateTime<Utc>) {
        if self
            .last_analysis_watermark
            .is_none_or(|current| timestamp > current)
        {
            self.last_analysis_watermark = Some(timestamp);
        }
    }

    /// Clears the watermark so the next cycle reprocesses full history.
    ///
    /// Evidence-level dedup in the discovery layer prevents duplicate
    /// suggestions for messages that already produced a derived task.
    pub const fn clear_watermark(&mut self) {
        self.last_analysis_watermark = None;
    }

    /// Records a successfully completed cycle.
    pub fn record_sync_success(&mut self, clock: &impl Clock) {
        self.last_sync_at = Some(clock.utc());
        self.last_error = None;
    }

    /// Records a failed cycle with its error text.
    pub fn record_sync_error(&mut self, error: impl Into<String>, clock: &impl Clock) {
        self.last_sync_at = Some(clock.utc());
        self.last_error = Some(error.into());
    }

    /// Returns the current sync-health snapshot.
    #[must_use]
    pub fn health(&self) -> SyncHealthSnapshot {
        SyncHealthSnapshot::new(self.last_sync_at, self.last_error.clone())
    }

    /// Returns whether an interval-driven cycle is due at `now`.
    ///
    /// A connection with no recorded sync attempt is always due.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.last_sync_at
            .is_none_or(|last| last + self.sync_interval.as_duration() <= now)
    }
}
