//! Diesel row models for message persistence.

use super::schema::messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for message records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Derived message identifier.
    pub id: String,
    /// Upstream channel identifier.
    pub channel_id: String,
    /// Message text.
    pub text: String,
    /// Upstream author identifier.
    pub author_id: String,
    /// Author classification.
    pub kind: String,
    /// Upstream message timestamp.
    pub source_timestamp: DateTime<Utc>,
    /// Optional thread identifier.
    pub thread_id: Option<String>,
    /// Whether the message was edited upstream.
    pub is_edited: bool,
    /// Whether the message was deleted upstream.
    pub is_deleted: bool,
}

/// Insert/upsert model for message records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Derived message identifier.
    pub id: String,
    /// Upstream channel identifier.
    pub channel_id: String,
    /// Message text.
    pub text: String,
    /// Upstream author identifier.
    pub author_id: String,
    /// Author classification.
    pub kind: String,
    /// Upstream message timestamp.
    pub source_timestamp: DateTime<Utc>,
    /// Optional thread identifier.
    pub thread_id: Option<String>,
    /// Whether the message was edited upstream.
    pub is_edited: bool,
    /// Whether the message was deleted upstream.
    pub is_deleted: bool,
}
