//! Batch analysis pipeline turning eligible messages into derived tasks.

use crate::channel::domain::{ChannelId, ChannelName, ProjectId};
use crate::discovery::{
    domain::{ConfidenceScore, DerivedTask},
    ports::{
        AnalysisEngine, AnalysisEngineError, DerivedTaskRepository, DerivedTaskRepositoryError,
        MessageInput, ProjectDirectory,
    },
};
use crate::message::domain::MessageRecord;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Largest message batch sent to the engine in a single call.
pub const DEFAULT_BATCH_CAP: usize = 50;

/// Service-level errors for the discovery pipeline.
#[derive(Debug, Error)]
pub enum TaskDiscoveryError {
    /// The analysis engine failed or answered garbage.
    #[error(transparent)]
    Engine(#[from] AnalysisEngineError),

    /// Derived-task persistence failed.
    #[error(transparent)]
    Repository(#[from] DerivedTaskRepositoryError),
}

/// Result type for discovery pipeline operations.
pub type TaskDiscoveryResult<T> = Result<T, TaskDiscoveryError>;

/// Runs eligible messages through the analysis engine and persists the
/// surviving candidates as suggested tasks.
#[derive(Clone)]
pub struct TaskDiscoveryService<D, E, P, C>
where
    D: DerivedTaskRepository,
    E: AnalysisEngine,
    P: ProjectDirectory,
    C: Clock + Send + Sync,
{
    repository: Arc<D>,
    engine: Arc<E>,
    projects: Arc<P>,
    clock: Arc<C>,
    batch_cap: usize,
    confidence_floor: ConfidenceScore,
}

impl<D, E, P, C> TaskDiscoveryService<D, E, P, C>
where
    D: DerivedTaskRepository,
    E: AnalysisEngine,
    P: ProjectDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline with the default batch cap and confidence floor.
    #[must_use]
    pub fn new(repository: Arc<D>, engine: Arc<E>, projects: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            repository,
            engine,
            projects,
            clock,
            batch_cap: DEFAULT_BATCH_CAP,
            confidence_floor: ConfidenceScore::DEFAULT_FLOOR,
        }
    }

    /// Overrides the batch cap. Values below one are clamped to one.
    #[must_use]
    pub fn with_batch_cap(mut self, batch_cap: usize) -> Self {
        self.batch_cap = batch_cap.max(1);
        self
    }

    /// Overrides the confidence floor.
    #[must_use]
    pub const fn with_confidence_floor(mut self, floor: ConfidenceScore) -> Self {
        self.confidence_floor = floor;
        self
    }

    /// Analyses the given messages and stores new suggestions.
    ///
    /// Messages are chunked to the batch cap, candidates under the
    /// confidence floor are dropped, and messages that already back a
    /// derived task are never re-suggested. Returns the number of tasks
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDiscoveryError::Engine`] when an engine call fails and
    /// [`TaskDiscoveryError::Repository`] when persistence fails. A
    /// concurrent insert for the same source message is not an error; the
    /// candidate is skipped.
    pub async fn discover(
        &self,
        project_id: ProjectId,
        channel_id: &ChannelId,
        channel_name: &ChannelName,
        messages: &[MessageRecord],
    ) -> TaskDiscoveryResult<usize> {
        if messages.is_empty() {
            return Ok(0);
        }

        let context = self
            .projects
            .project_context(project_id)
            .await
            .unwrap_or_default();

        let mut stored = 0;
        for chunk in messages.chunks(self.batch_cap) {
            let inputs: Vec<MessageInput> = chunk
                .iter()
                .map(|record| to_input(record, channel_name))
                .collect();
            let candidates = self.engine.analyze(&inputs, &context).await?;

            for candidate in candidates {
                if !candidate.confidence().meets(self.confidence_floor) {
                    continue;
                }
                if self
                    .repository
                    .exists_for_source(candidate.source_message_id())
                    .await?
                {
                    continue;
                }

                let task = DerivedTask::from_candidate(
                    project_id,
                    channel_id.clone(),
                    &candidate,
                    &*self.clock,
                );
                match self.repository.store(&task).await {
                    Ok(()) => stored += 1,
                    // Lost a race with another cycle citing the same message.
                    Err(DerivedTaskRepositoryError::DuplicateEvidence(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(stored)
    }
}

fn to_input(record: &MessageRecord, channel_name: &ChannelName) -> MessageInput {
    MessageInput {
        message_id: record.id().clone(),
        text: record.text().to_owned(),
        author_id: record.author_id().to_owned(),
        timestamp: record.source_timestamp(),
        channel_context: format!("#{}", channel_name.as_str()),
    }
}
