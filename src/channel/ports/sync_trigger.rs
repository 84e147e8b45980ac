//! Port for scheduling a sync cycle without blocking on its completion.

use crate::channel::domain::{ChannelId, ProjectId};

/// Fire-and-forget sync trigger.
///
/// A successful connect schedules an initial cycle through this port; the
/// cycle's outcome is observable afterwards via connection metadata, never
/// as a return value here. Connection state and sync state stay independent:
/// a failed initial cycle does not roll back the connection.
pub trait SyncTrigger: Send + Sync {
    /// Requests a sync cycle for the pair. Returns immediately.
    fn trigger(&self, project_id: ProjectId, channel_id: &ChannelId);
}
