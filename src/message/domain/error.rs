//! Error types for message domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing message domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageDomainError {
    /// The message identifier is empty after trimming.
    #[error("message identifier must not be empty")]
    EmptyMessageId,
}

/// Error returned while parsing message kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message kind: {0}")]
pub struct ParseMessageKindError(pub String);
