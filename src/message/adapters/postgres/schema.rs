//! Diesel schema for message persistence.

diesel::table! {
    /// Raw channel messages, keyed by derived identifier.
    messages (id) {
        /// Derived identifier: `channel_id:source_timestamp_micros`.
        #[max_length = 255]
        id -> Varchar,
        /// Upstream channel identifier.
        #[max_length = 255]
        channel_id -> Varchar,
        /// Message text.
        text -> Text,
        /// Upstream author identifier.
        #[max_length = 255]
        author_id -> Varchar,
        /// Author classification.
        #[max_length = 50]
        kind -> Varchar,
        /// Upstream message timestamp.
        source_timestamp -> Timestamptz,
        /// Optional thread identifier.
        #[max_length = 255]
        thread_id -> Nullable<Varchar>,
        /// Whether the message was edited upstream.
        is_edited -> Bool,
        /// Whether the message was deleted upstream.
        is_deleted -> Bool,
    }
}
