//! Diesel row models for derived-task persistence.

use super::schema::derived_tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for derived tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = derived_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DerivedTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Channel the evidence came from.
    pub channel_id: String,
    /// Message the suggestion was derived from.
    pub source_message_id: String,
    /// Suggested title.
    pub title: String,
    /// Supporting description.
    pub description: String,
    /// Engine-assigned confidence.
    pub confidence_score: f64,
    /// Lifecycle state.
    pub status: String,
    /// Workspace task created from it, if any.
    pub created_task_id: Option<uuid::Uuid>,
    /// When the suggestion was recorded.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for derived tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = derived_tasks)]
pub struct NewDerivedTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Channel the evidence came from.
    pub channel_id: String,
    /// Message the suggestion was derived from.
    pub source_message_id: String,
    /// Suggested title.
    pub title: String,
    /// Supporting description.
    pub description: String,
    /// Engine-assigned confidence.
    pub confidence_score: f64,
    /// Lifecycle state.
    pub status: String,
    /// Workspace task created from it, if any.
    pub created_task_id: Option<uuid::Uuid>,
    /// When the suggestion was recorded.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied when a task moves through its lifecycle.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = derived_tasks)]
pub struct DerivedTaskTransitionChangeset {
    /// New lifecycle state.
    pub status: String,
    /// Workspace task created from it, if any.
    pub created_task_id: Option<uuid::Uuid>,
    /// Transition timestamp.
    pub updated_at: DateTime<Utc>,
}
