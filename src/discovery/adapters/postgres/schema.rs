//! Diesel schema for derived-task persistence.

diesel::table! {
    /// Task suggestions derived from channel messages.
    derived_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Channel the evidence came from.
        channel_id -> Varchar,
        /// Message the suggestion was derived from. Unique.
        source_message_id -> Varchar,
        /// Suggested title.
        title -> Varchar,
        /// Supporting description.
        description -> Text,
        /// Engine-assigned confidence in 0.0..=1.0.
        confidence_score -> Float8,
        /// Lifecycle state.
        status -> Varchar,
        /// Workspace task created from it, if any.
        created_task_id -> Nullable<Uuid>,
        /// When the suggestion was recorded.
        created_at -> Timestamptz,
        /// When it last changed.
        updated_at -> Timestamptz,
    }
}
