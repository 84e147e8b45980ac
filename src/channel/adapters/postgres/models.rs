//! Diesel row models for channel connection persistence.

use super::schema::connections;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for connection records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConnectionRow {
    /// Internal connection identifier.
    pub id: uuid::Uuid,
    /// Workspace project identifier.
    pub project_id: uuid::Uuid,
    /// Upstream channel identifier.
    pub channel_id: String,
    /// Human-readable channel name.
    pub channel_name: String,
    /// Connection timestamp.
    pub connected_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Sync cadence in minutes.
    pub sync_interval_minutes: i32,
    /// Analysis watermark, if any.
    pub last_analysis_watermark: Option<DateTime<Utc>>,
    /// Most recent sync attempt, if any.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Error text from the most recent failed cycle, if any.
    pub last_error: Option<String>,
}

/// Insert model for connection records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = connections)]
pub struct NewConnectionRow {
    /// Internal connection identifier.
    pub id: uuid::Uuid,
    /// Workspace project identifier.
    pub project_id: uuid::Uuid,
    /// Upstream channel identifier.
    pub channel_id: String,
    /// Human-readable channel name.
    pub channel_name: String,
    /// Connection timestamp.
    pub connected_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Sync cadence in minutes.
    pub sync_interval_minutes: i32,
    /// Analysis watermark, if any.
    pub last_analysis_watermark: Option<DateTime<Utc>>,
    /// Most recent sync attempt, if any.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Error text from the most recent failed cycle, if any.
    pub last_error: Option<String>,
}
