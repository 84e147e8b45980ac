//! Shared doubles and fixtures for in-memory integration tests.

use async_trait::async_trait;
use chantier::channel::{
    adapters::memory::InMemoryConnectionRepository,
    domain::{ChannelConnection, ChannelId, ProjectId},
    ports::{
        ChannelApi, ChannelApiError, ConnectionRepository, ConnectionRepositoryError,
        ConnectionRepositoryResult, MessagePage, SyncTrigger,
    },
};
use chantier::discovery::{
    domain::{ConfidenceScore, TaskCandidate},
    ports::{AnalysisEngine, AnalysisEngineError, MessageInput, ProjectContext},
};
use chantier::message::domain::{MessageKind, MessageRecord};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Clock pinned to a settable instant.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(seconds: i64) -> Self {
        let now = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .expect("valid timestamp");
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(delta).expect("time stays in range");
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().expect("valid time")
}

pub fn user_message(channel_id: &ChannelId, seconds: i64, text: &str) -> MessageRecord {
    MessageRecord::new(
        channel_id.clone(),
        text,
        "U100",
        MessageKind::User,
        at(seconds),
    )
}

pub fn bot_message(channel_id: &ChannelId, seconds: i64, text: &str) -> MessageRecord {
    MessageRecord::new(
        channel_id.clone(),
        text,
        "B900",
        MessageKind::Bot,
        at(seconds),
    )
}

/// Channel API double that serves a scripted queue of fetch results.
///
/// Each `fetch_page` call pops the next scripted result; an empty queue
/// serves empty pages. An optional per-fetch delay keeps a cycle in
/// flight long enough for concurrency tests to observe it.
pub struct ScriptedChannelApi {
    results: Mutex<VecDeque<Result<MessagePage, ChannelApiError>>>,
    oldest_seen: Mutex<Vec<Option<DateTime<Utc>>>>,
    fetch_calls: AtomicUsize,
    fetch_delay: Option<Duration>,
    accessible: bool,
}

impl ScriptedChannelApi {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            oldest_seen: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            fetch_delay: None,
            accessible: true,
        }
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn denying_access(mut self) -> Self {
        self.accessible = false;
        self
    }

    pub fn push_page(&self, page: MessagePage) {
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        results.push_back(Ok(page));
    }

    pub fn push_error(&self, error: ChannelApiError) {
        let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        results.push_back(Err(error));
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// The `oldest` bound each fetch was made with, in call order.
    pub fn oldest_bounds(&self) -> Vec<Option<DateTime<Utc>>> {
        self.oldest_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChannelApi for ScriptedChannelApi {
    async fn fetch_page(
        &self,
        _channel_id: &ChannelId,
        oldest: Option<DateTime<Utc>>,
        _page_token: Option<&str>,
        _limit: u32,
    ) -> Result<MessagePage, ChannelApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut seen = self
                .oldest_seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            seen.push(oldest);
        }
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let next = {
            let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
            results.pop_front()
        };
        next.unwrap_or_else(|| Ok(MessagePage::empty()))
    }

    async fn probe_access(&self, _channel_id: &ChannelId) -> Result<bool, ChannelApiError> {
        Ok(self.accessible)
    }
}

/// Analysis engine double that suggests one task per incoming message.
///
/// A scripted error queue lets tests fail exactly one analysis call.
pub struct EchoAnalysisEngine {
    confidence: f64,
    pending_errors: Mutex<VecDeque<AnalysisEngineError>>,
}

impl EchoAnalysisEngine {
    pub fn suggesting_at(confidence: f64) -> Self {
        Self {
            confidence,
            pending_errors: Mutex::new(VecDeque::new()),
        }
    }

    pub fn fail_next(&self, error: AnalysisEngineError) {
        let mut pending = self
            .pending_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.push_back(error);
    }
}

#[async_trait]
impl AnalysisEngine for EchoAnalysisEngine {
    async fn analyze(
        &self,
        messages: &[MessageInput],
        _context: &ProjectContext,
    ) -> Result<Vec<TaskCandidate>, AnalysisEngineError> {
        let scripted = {
            let mut pending = self
                .pending_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            pending.pop_front()
        };
        if let Some(error) = scripted {
            return Err(error);
        }

        let confidence = ConfidenceScore::new(self.confidence).expect("valid confidence");
        messages
            .iter()
            .map(|input| {
                TaskCandidate::new(
                    &format!("Follow up: {}", input.text),
                    &input.text,
                    confidence,
                    input.message_id.clone(),
                )
                .map_err(|err| AnalysisEngineError::MalformedResponse(err.to_string()))
            })
            .collect()
    }
}

/// Connection repository double whose pair lookups fail.
///
/// Listing and seeding work normally, so a fleet can be discovered and
/// then hit a persistence failure inside its individual cycles.
pub struct FailingPairLookupRepository {
    inner: InMemoryConnectionRepository,
}

impl FailingPairLookupRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryConnectionRepository::new(),
        }
    }
}

impl Default for FailingPairLookupRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRepository for FailingPairLookupRepository {
    async fn store(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        self.inner.store(connection).await
    }

    async fn update(&self, connection: &ChannelConnection) -> ConnectionRepositoryResult<()> {
        self.inner.update(connection).await
    }

    async fn find_by_pair(
        &self,
        _project_id: ProjectId,
        _channel_id: &ChannelId,
    ) -> ConnectionRepositoryResult<Option<ChannelConnection>> {
        Err(ConnectionRepositoryError::persistence(
            std::io::Error::other("connection store offline"),
        ))
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        self.inner.list_by_project(project_id).await
    }

    async fn list_active(&self) -> ConnectionRepositoryResult<Vec<ChannelConnection>> {
        self.inner.list_active().await
    }
}

/// Trigger double that records every requested pair.
#[derive(Default)]
pub struct RecordingTrigger {
    requests: Mutex<Vec<(ProjectId, ChannelId)>>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<(ProjectId, ChannelId)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SyncTrigger for RecordingTrigger {
    fn trigger(&self, project_id: ProjectId, channel_id: &ChannelId) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        requests.push((project_id, channel_id.clone()));
    }
}
