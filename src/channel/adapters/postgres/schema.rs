//! Diesel schema for channel connection persistence.

diesel::table! {
    /// Project-to-channel connections with sync metadata.
    connections (id) {
        /// Internal connection identifier.
        id -> Uuid,
        /// Workspace project identifier.
        project_id -> Uuid,
        /// Upstream channel identifier.
        #[max_length = 255]
        channel_id -> Varchar,
        /// Human-readable channel name.
        #[max_length = 255]
        channel_name -> Varchar,
        /// Connection timestamp.
        connected_at -> Timestamptz,
        /// Soft-delete flag.
        is_active -> Bool,
        /// Sync cadence in minutes.
        sync_interval_minutes -> Int4,
        /// Analysis watermark; null means full history is unprocessed.
        last_analysis_watermark -> Nullable<Timestamptz>,
        /// Most recent sync attempt.
        last_sync_at -> Nullable<Timestamptz>,
        /// Error text from the most recent failed cycle.
        last_error -> Nullable<Text>,
    }
}
