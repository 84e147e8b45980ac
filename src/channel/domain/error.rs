//! Error types for channel domain validation.

use thiserror::Error;

/// Errors returned while constructing channel domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelDomainError {
    /// The channel identifier is empty or contains whitespace.
    #[error("invalid channel identifier '{0}'")]
    InvalidChannelId(String),

    /// The channel name is empty after trimming.
    #[error("channel name must not be empty")]
    EmptyChannelName,

    /// The sync interval is outside the allowed range.
    #[error("invalid sync interval {0}, expected 1 to 1440 minutes")]
    InvalidSyncInterval(u32),
}
