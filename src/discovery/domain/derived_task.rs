//! Derived-task aggregate and its approval lifecycle.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::candidate::{ConfidenceScore, TaskCandidate};
use super::error::{DiscoveryDomainError, ParseDerivedTaskStatusError};
use super::ids::{DerivedTaskId, WorkspaceTaskId};
use crate::channel::domain::{ChannelId, ProjectId};
use crate::message::domain::MessageId;

/// Lifecycle state of a derived task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedTaskStatus {
    /// Awaiting triage by a project member.
    Suggested,
    /// Approved and queued for workspace task creation.
    Accepted,
    /// Declined; kept for evidence deduplication.
    Rejected,
    /// A workspace task has been created from it.
    Created,
}

impl DerivedTaskStatus {
    /// Returns the canonical string form used in persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suggested => "suggested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Created => "created",
        }
    }

    /// Returns true when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Created)
    }

    /// Whether the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Suggested, Self::Accepted | Self::Rejected) | (Self::Accepted, Self::Created)
        )
    }
}

impl std::fmt::Display for DerivedTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DerivedTaskStatus {
    type Error = ParseDerivedTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "suggested" => Ok(Self::Suggested),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "created" => Ok(Self::Created),
            other => Err(ParseDerivedTaskStatusError(other.to_string())),
        }
    }
}

/// Raw persisted fields used to rebuild a [`DerivedTask`] without
/// re-running lifecycle rules.
#[derive(Debug, Clone)]
pub struct PersistedDerivedTaskData {
    /// Task identifier.
    pub id: DerivedTaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Channel the evidence came from.
    pub channel_id: ChannelId,
    /// Message the suggestion was derived from.
    pub source_message_id: MessageId,
    /// Suggested title.
    pub title: String,
    /// Supporting description.
    pub description: String,
    /// Engine-assigned confidence.
    pub confidence: ConfidenceScore,
    /// Current lifecycle state.
    pub status: DerivedTaskStatus,
    /// Workspace task created from it, if any.
    pub created_task_id: Option<WorkspaceTaskId>,
    /// When the suggestion was recorded.
    pub created_at: DateTime<Utc>,
    /// When it last changed.
    pub updated_at: DateTime<Utc>,
}

/// A task suggestion under triage, tied to its source message.
#[derive(Debug, Clone)]
pub struct DerivedTask {
    id: DerivedTaskId,
    project_id: ProjectId,
    channel_id: ChannelId,
    source_message_id: MessageId,
    title: String,
    description: String,
    confidence: ConfidenceScore,
    status: DerivedTaskStatus,
    created_task_id: Option<WorkspaceTaskId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DerivedTask {
    /// Records a fresh suggestion from an analysis candidate.
    #[must_use]
    pub fn from_candidate(
        project_id: ProjectId,
        channel_id: ChannelId,
        candidate: &TaskCandidate,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.utc();
        Self {
            id: DerivedTaskId::new(),
            project_id,
            channel_id,
            source_message_id: candidate.source_message_id().clone(),
            title: candidate.title().to_string(),
            description: candidate.description().to_string(),
            confidence: candidate.confidence(),
            status: DerivedTaskStatus::Suggested,
            created_task_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds an aggregate from persisted data.
    #[must_use]
    pub fn from_persisted(data: PersistedDerivedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            channel_id: data.channel_id,
            source_message_id: data.source_message_id,
            title: data.title,
            description: data.description,
            confidence: data.confidence,
            status: data.status,
            created_task_id: data.created_task_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Task identifier.
    #[must_use]
    pub const fn id(&self) -> DerivedTaskId {
        self.id
    }

    /// Owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Channel the evidence came from.
    #[must_use]
    pub const fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Message the suggestion was derived from.
    #[must_use]
    pub const fn source_message_id(&self) -> &MessageId {
        &self.source_message_id
    }

    /// Suggested title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Supporting description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Engine-assigned confidence.
    #[must_use]
    pub const fn confidence(&self) -> ConfidenceScore {
        self.confidence
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> DerivedTaskStatus {
        self.status
    }

    /// Workspace task created from it, if any.
    #[must_use]
    pub const fn created_task_id(&self) -> Option<WorkspaceTaskId> {
        self.created_task_id
    }

    /// When the suggestion was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When it last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Approves the suggestion for workspace task creation.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryDomainError::InvalidTransition`] unless the task
    /// is currently suggested.
    pub fn accept(&mut self, clock: &dyn Clock) -> Result<(), DiscoveryDomainError> {
        self.transition_to(DerivedTaskStatus::Accepted, clock)
    }

    /// Declines the suggestion. The evidence record is kept so the same
    /// message is never re-suggested.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryDomainError::InvalidTransition`] unless the task
    /// is currently suggested.
    pub fn reject(&mut self, clock: &dyn Clock) -> Result<(), DiscoveryDomainError> {
        self.transition_to(DerivedTaskStatus::Rejected, clock)
    }

    /// Records the workspace task created from an accepted suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryDomainError::InvalidTransition`] unless the task
    /// is currently accepted.
    pub fn mark_created(
        &mut self,
        workspace_task_id: WorkspaceTaskId,
        clock: &dyn Clock,
    ) -> Result<(), DiscoveryDomainError> {
        self.transition_to(DerivedTaskStatus::Created, clock)?;
        self.created_task_id = Some(workspace_task_id);
        Ok(())
    }

    fn transition_to(
        &mut self,
        next: DerivedTaskStatus,
        clock: &dyn Clock,
    ) -> Result<(), DiscoveryDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DiscoveryDomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = clock.utc();
        Ok(())
    }
}
