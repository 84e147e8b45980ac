//! Error types for discovery domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or mutating discovery domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DiscoveryDomainError {
    /// The confidence score is outside 0.0..=1.0 or not finite.
    #[error("invalid confidence score {0}, expected a finite value in 0.0..=1.0")]
    InvalidConfidence(f64),

    /// The candidate title is empty after trimming.
    #[error("candidate title must not be empty")]
    EmptyCandidateTitle,

    /// The requested status change violates the lifecycle state machine.
    #[error("invalid derived-task transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// State the task was in.
        from: String,
        /// State the caller asked for.
        to: String,
    },
}

/// Error returned while parsing derived-task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown derived-task status: {0}")]
pub struct ParseDerivedTaskStatusError(pub String);
