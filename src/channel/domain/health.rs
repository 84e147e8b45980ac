//! Sync-health snapshot exposed to callers as connection metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time sync health for one channel connection.
///
/// The orchestrator records outcomes on the connection after every cycle, so
/// callers can answer "which channels have issues" without subscribing to any
/// notification stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncHealthSnapshot {
    last_sync_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl SyncHealthSnapshot {
    /// Creates a snapshot from recorded sync metadata.
    #[must_use]
    pub const fn new(last_sync_at: Option<DateTime<Utc>>, last_error: Option<String>) -> Self {
        Self {
            last_sync_at,
            last_error,
        }
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

    /// Returns whether the most recent cycle completed without error.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}
