//! Port to the analysis engine that extracts task candidates from
//! message batches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::discovery::domain::TaskCandidate;
use crate::message::domain::MessageId;

/// A message prepared for analysis, with the context the engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    /// Stable message identifier, echoed back in candidates.
    pub message_id: MessageId,
    /// Message text.
    pub text: String,
    /// Author identifier in the source platform.
    pub author_id: String,
    /// When the message was posted.
    pub timestamp: DateTime<Utc>,
    /// Human-readable channel context, e.g. the channel name.
    pub channel_context: String,
}

/// Project description supplied alongside the batch so the engine can
/// judge relevance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectContext {
    /// Project name.
    pub name: String,
    /// Free-form project description.
    pub description: String,
}

/// Errors surfaced by the analysis engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisEngineError {
    /// The engine call failed outright.
    #[error("analysis engine call failed: {0}")]
    Failed(String),

    /// The engine answered with a payload that could not be decoded.
    #[error("analysis engine returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Extracts task candidates from a batch of messages.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Analyses a batch and returns zero or more candidates.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisEngineError::Failed`] when the call fails or
    /// [`AnalysisEngineError::MalformedResponse`] when the reply cannot be
    /// decoded.
    async fn analyze(
        &self,
        messages: &[MessageInput],
        context: &ProjectContext,
    ) -> Result<Vec<TaskCandidate>, AnalysisEngineError>;
}
