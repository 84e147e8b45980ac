//! Task candidates produced by the analysis engine.

use serde::{Deserialize, Serialize};

use super::error::DiscoveryDomainError;
use crate::message::domain::MessageId;

/// Validated confidence score in the closed range 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ConfidenceScore(f64);

impl ConfidenceScore {
    /// Default threshold below which candidates are discarded.
    pub const DEFAULT_FLOOR: Self = Self(0.5);

    /// Validates and wraps a raw score.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryDomainError::InvalidConfidence`] when the value is
    /// not finite or falls outside 0.0..=1.0.
    pub fn new(value: f64) -> Result<Self, DiscoveryDomainError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DiscoveryDomainError::InvalidConfidence(value))
        }
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns true when the score meets or exceeds the given floor.
    #[must_use]
    pub fn meets(self, floor: Self) -> bool {
        self.0 >= floor.0
    }
}

impl std::fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A task suggestion extracted from a single source message.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCandidate {
    title: String,
    description: String,
    confidence: ConfidenceScore,
    source_message_id: MessageId,
}

impl TaskCandidate {
    /// Creates a candidate with a validated, trimmed title.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryDomainError::EmptyCandidateTitle`] when the title
    /// is blank.
    pub fn new(
        title: &str,
        description: &str,
        confidence: ConfidenceScore,
        source_message_id: MessageId,
    ) -> Result<Self, DiscoveryDomainError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DiscoveryDomainError::EmptyCandidateTitle);
        }
        Ok(Self {
            title: trimmed.to_string(),
            description: description.trim().to_string(),
            confidence,
            source_message_id,
        })
    }

    /// Suggested task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Supporting description, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Engine-assigned confidence.
    #[must_use]
    pub const fn confidence(&self) -> ConfidenceScore {
        self.confidence
    }

    /// Message the suggestion was derived from.
    #[must_use]
    pub const fn source_message_id(&self) -> &MessageId {
        &self.source_message_id
    }
}
