//! HTTP adapter for Slack-style channel history APIs.
//!
//! Speaks the `conversations.history` / `conversations.info` wire shape:
//! bearer-token auth, an `ok`/`error` JSON envelope, decimal-string message
//! timestamps, and HTTP 429 with a `Retry-After` header for throttling.

use crate::channel::{
    domain::ChannelId,
    ports::{ChannelApi, ChannelApiError, MessagePage},
};
use crate::message::domain::{MessageKind, MessageRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Channel API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChannelApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpChannelApi {
    /// Creates a client against `base_url` using a bearer `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelApiError::Failed`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ChannelApiError> {
        Self::with_timeout(base_url, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelApiError::Failed`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChannelApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ChannelApiError::Failed(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<WireMessage>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    ts: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
    #[serde(default)]
    edited: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct InfoEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ChannelApi for HttpChannelApi {
    async fn fetch_page(
        &self,
        channel_id: &ChannelId,
        oldest: Option<DateTime<Utc>>,
        page_token: Option<&str>,
        limit: u32,
    ) -> Result<MessagePage, ChannelApiError> {
        let mut query: Vec<(&str, String)> = vec![
            ("channel", channel_id.as_str().to_owned()),
            ("limit", limit.to_string()),
        ];
        // The upstream API mishandles oldest combined with a cursor, so only
        // one of the two is ever sent.
        if let Some(cursor) = page_token {
            query.push(("cursor", cursor.to_owned()));
        } else if let Some(oldest_ts) = oldest {
            query.push(("oldest", encode_wire_timestamp(oldest_ts)));
        }

        let response = self
            .client
            .get(self.endpoint("conversations.history"))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChannelApiError::Throttled {
                retry_after: parse_retry_after(&response),
            });
        }
        if !response.status().is_success() {
            return Err(ChannelApiError::Failed(format!(
                "HTTP {} from channel history endpoint",
                response.status().as_u16()
            )));
        }

        let envelope: HistoryEnvelope = response
            .json()
            .await
            .map_err(|err| ChannelApiError::Failed(format!("malformed history response: {err}")))?;
        if !envelope.ok {
            return Err(envelope_error(envelope.error));
        }

        let mut messages = Vec::with_capacity(envelope.messages.len());
        for wire in envelope.messages {
            if let Some(record) = decode_wire_message(channel_id, wire) {
                messages.push(record);
            }
        }
        messages.sort_by_key(MessageRecord::source_timestamp);

        let next_page_token = envelope
            .response_metadata
            .and_then(|meta| meta.next_cursor)
            .filter(|cursor| !cursor.is_empty());

        Ok(MessagePage {
            messages,
            next_page_token,
        })
    }

    async fn probe_access(&self, channel_id: &ChannelId) -> Result<bool, ChannelApiError> {
        let response = self
            .client
            .get(self.endpoint("conversations.info"))
            .bearer_auth(&self.token)
            .query(&[("channel", channel_id.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChannelApiError::Throttled {
                retry_after: parse_retry_after(&response),
            });
        }
        if response.status() == StatusCode::FORBIDDEN || response.status() == StatusCode::NOT_FOUND
        {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(ChannelApiError::Failed(format!(
                "HTTP {} from channel info endpoint",
                response.status().as_u16()
            )));
        }

        let envelope: InfoEnvelope = response
            .json()
            .await
            .map_err(|err| ChannelApiError::Failed(format!("malformed info response: {err}")))?;
        if envelope.ok {
            return Ok(true);
        }
        match envelope.error.as_deref() {
            Some("channel_not_found" | "not_in_channel" | "missing_scope" | "access_denied") => {
                Ok(false)
            }
            Some("ratelimited" | "rate_limited") => Err(ChannelApiError::Throttled {
                retry_after: None,
            }),
            other => Err(envelope_error(other.map(str::to_owned))),
        }
    }
}

fn transport_error(err: reqwest::Error) -> ChannelApiError {
    if err.is_timeout() {
        ChannelApiError::Failed("channel API request timed out".to_owned())
    } else {
        ChannelApiError::Failed(err.to_string())
    }
}

fn envelope_error(error: Option<String>) -> ChannelApiError {
    let code = error.unwrap_or_else(|| "unknown_error".to_owned());
    if code == "ratelimited" || code == "rate_limited" {
        return ChannelApiError::Throttled { retry_after: None };
    }
    ChannelApiError::Failed(format!("channel API error: {code}"))
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Decodes a `seconds.micros` decimal timestamp without float arithmetic.
fn parse_wire_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let (seconds_part, fraction_part) = raw.split_once('.').unwrap_or((raw, ""));
    let seconds: i64 = seconds_part.parse().ok()?;
    let mut micros: u32 = 0;
    if !fraction_part.is_empty() {
        let padded: String = fraction_part.chars().chain("000000".chars()).take(6).collect();
        micros = padded.parse().ok()?;
    }
    DateTime::from_timestamp(seconds, micros.checked_mul(1000)?)
}

fn encode_wire_timestamp(timestamp: DateTime<Utc>) -> String {
    let micros = timestamp.timestamp_micros();
    let seconds = micros.div_euclid(1_000_000);
    let fraction = micros.rem_euclid(1_000_000);
    format!("{seconds}.{fraction:06}")
}

fn decode_wire_message(channel_id: &ChannelId, wire: WireMessage) -> Option<MessageRecord> {
    let source_timestamp = parse_wire_timestamp(&wire.ts)?;

    let kind = if wire.bot_id.is_some() || wire.subtype.as_deref() == Some("bot_message") {
        MessageKind::Bot
    } else if wire.subtype.is_some() {
        // Non-bot subtypes are channel housekeeping (joins, leaves, topic
        // changes) as far as discovery is concerned.
        MessageKind::System
    } else {
        MessageKind::User
    };

    let author_id = wire
        .user
        .or(wire.bot_id)
        .unwrap_or_else(|| "unknown".to_owned());

    let mut record = MessageRecord::new(
        channel_id.clone(),
        wire.text,
        author_id,
        kind,
        source_timestamp,
    );
    if let Some(thread_ts) = wire.thread_ts {
        record = record.with_thread_id(thread_ts);
    }
    if wire.edited.is_some() {
        record = record.edited();
    }
    Some(record)
}
