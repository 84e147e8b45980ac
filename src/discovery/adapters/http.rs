//! HTTP adapter for the task-analysis engine.
//!
//! POSTs a rendered instruction prompt plus the structured message batch
//! and decodes a JSON candidate list. Entries that fail validation are
//! dropped individually so one bad candidate never sinks the batch.

use crate::discovery::{
    domain::{ConfidenceScore, TaskCandidate},
    ports::{AnalysisEngine, AnalysisEngineError, MessageInput, ProjectContext},
};
use crate::message::domain::MessageId;
use async_trait::async_trait;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Analysis calls run a model server side, so the budget is generous.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const PROMPT_TEMPLATE: &str = "\
You extract actionable tasks from team chat for the project \
\"{{ project_name }}\".\n\
Project description: {{ project_description }}\n\
Return only tasks with clear, concrete follow-up work. For each task \
report the identifier of the message it came from and a confidence \
between 0 and 1.";

/// Analysis engine client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnalysisEngine {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpAnalysisEngine {
    /// Creates a client against `endpoint` using a bearer `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisEngineError::Failed`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, AnalysisEngineError> {
        Self::with_timeout(endpoint, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisEngineError::Failed`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisEngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AnalysisEngineError::Failed(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    prompt: String,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    message_id: &'a str,
    text: &'a str,
    author_id: &'a str,
    timestamp: String,
    channel_context: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    title: String,
    #[serde(default)]
    description: String,
    confidence_score: f64,
    source_message_id: String,
}

fn render_prompt(context: &ProjectContext) -> Result<String, AnalysisEngineError> {
    let environment = Environment::new();
    environment
        .render_str(
            PROMPT_TEMPLATE,
            minijinja::context! {
                project_name => context.name,
                project_description => context.description,
            },
        )
        .map_err(|err| AnalysisEngineError::Failed(err.to_string()))
}

fn decode_candidate(wire: WireCandidate) -> Option<TaskCandidate> {
    let confidence = ConfidenceScore::new(wire.confidence_score).ok()?;
    let source_message_id = MessageId::new(wire.source_message_id).ok()?;
    TaskCandidate::new(&wire.title, &wire.description, confidence, source_message_id).ok()
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    async fn analyze(
        &self,
        messages: &[MessageInput],
        context: &ProjectContext,
    ) -> Result<Vec<TaskCandidate>, AnalysisEngineError> {
        let request = AnalysisRequest {
            prompt: render_prompt(context)?,
            messages: messages
                .iter()
                .map(|input| WireMessage {
                    message_id: input.message_id.as_str(),
                    text: &input.text,
                    author_id: &input.author_id,
                    timestamp: input.timestamp.to_rfc3339(),
                    channel_context: &input.channel_context,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|err| AnalysisEngineError::Failed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisEngineError::Failed(format!(
                "analysis endpoint answered {status}"
            )));
        }

        let body: AnalysisResponse = response
            .json()
            .await
            .map_err(|err| AnalysisEngineError::MalformedResponse(err.to_string()))?;

        Ok(body
            .candidates
            .into_iter()
            .filter_map(decode_candidate)
            .collect())
    }
}
