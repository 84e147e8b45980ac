//! Port for the external message-channel API.

use crate::channel::domain::ChannelId;
use crate::message::domain::MessageRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// One fetched page of channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    /// Messages in the page, oldest first.
    pub messages: Vec<MessageRecord>,
    /// Opaque cursor for the next page, when more history exists.
    pub next_page_token: Option<String>,
}

impl MessagePage {
    /// Creates a page with no continuation cursor.
    #[must_use]
    pub const fn of(messages: Vec<MessageRecord>) -> Self {
        Self {
            messages,
            next_page_token: None,
        }
    }

    /// Creates an empty page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            messages: Vec::new(),
            next_page_token: None,
        }
    }
}

/// Contract for reading message history from an external channel.
///
/// Throttling is a distinct signal from generic failure so the rate-limit
/// breaker can tell "back off" apart from "transient error, retry soon".
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Fetches up to `limit` messages from a channel.
    ///
    /// `oldest` bounds the fetch to messages at or after the given
    /// timestamp; `page_token` continues a previous page.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelApiError::Throttled`] when the upstream rate limit
    /// was hit, or [`ChannelApiError::Failed`] for any other failure.
    async fn fetch_page(
        &self,
        channel_id: &ChannelId,
        oldest: Option<DateTime<Utc>>,
        page_token: Option<&str>,
        limit: u32,
    ) -> Result<MessagePage, ChannelApiError>;

    /// Probes whether the integration can read the channel.
    ///
    /// Returns `false` for a reachable channel the integration cannot read
    /// (not a member, channel not found).
    ///
    /// # Errors
    ///
    /// Returns [`ChannelApiError`] when the probe request itself fails.
    async fn probe_access(&self, channel_id: &ChannelId) -> Result<bool, ChannelApiError>;
}

/// Errors returned by channel API implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelApiError {
    /// The upstream rate limit was hit.
    #[error("channel API rate limited")]
    Throttled {
        /// Upstream-provided back-off hint, when one was sent.
        retry_after: Option<Duration>,
    },

    /// Transient or permanent failure distinct from throttling.
    #[error("channel API request failed: {0}")]
    Failed(String),
}
