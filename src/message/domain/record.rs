//! Raw message records fetched from external channels.

use super::{MessageDomainError, ParseMessageKindError};
use crate::channel::domain::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a message: `channel_id:source_timestamp_micros`.
///
/// The identifier is derived, not assigned, so re-fetching the same message
/// always maps to the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Derives the identifier for a message in a channel.
    #[must_use]
    pub fn from_parts(channel_id: &ChannelId, source_timestamp: DateTime<Utc>) -> Self {
        Self(format!(
            "{}:{}",
            channel_id.as_str(),
            source_timestamp.timestamp_micros()
        ))
    }

    /// Wraps a raw identifier, e.g. one echoed back by the analysis engine.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::EmptyMessageId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, MessageDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(MessageDomainError::EmptyMessageId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author classification of a channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Written by a human channel member.
    User,
    /// Posted by a bot integration.
    Bot,
    /// Channel housekeeping notice (join, leave, topic change).
    System,
}

impl MessageKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for MessageKind {
    type Error = ParseMessageKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            "system" => Ok(Self::System),
            _ => Err(ParseMessageKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One channel message as fetched from the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    id: MessageId,
    channel_id: ChannelId,
    text: String,
    author_id: String,
    kind: MessageKind,
    source_timestamp: DateTime<Utc>,
    thread_id: Option<String>,
    is_edited: bool,
    is_deleted: bool,
}

impl MessageRecord {
    /// Creates a record for a freshly fetched message.
    #[must_use]
    pub fn new(
        channel_id: ChannelId,
        text: impl Into<String>,
        author_id: impl Into<String>,
        kind: MessageKind,
        source_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::from_parts(&channel_id, source_timestamp),
            channel_id,
            text: text.into(),
            author_id: author_id.into(),
            kind,
            source_timestamp,
            thread_id: None,
            is_edited: false,
            is_deleted: false,
        }
    }

    /// Sets the thread this message belongs to.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Marks the message as edited upstream.
    #[must_use]
    pub const fn edited(mut self) -> Self {
        self.is_edited = true;
        self
    }

    /// Marks the message as deleted upstream.
    #[must_use]
    pub const fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// Returns the derived message identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the channel identifier.
    #[must_use]
    pub const fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the upstream author identifier.
    #[must_use]
    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    /// Returns the author classification.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the upstream timestamp.
    #[must_use]
    pub const fn source_timestamp(&self) -> DateTime<Utc> {
        self.source_timestamp
    }

    /// Returns the thread identifier, if any.
    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Returns whether the message was edited upstream.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.is_edited
    }

    /// Returns whether the message was deleted upstream.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Returns whether this message should be handed to analysis.
    ///
    /// Eligible messages are human-authored, non-empty, and strictly newer
    /// than the watermark when one is set. A `None` watermark means full
    /// history is eligible.
    #[must_use]
    pub fn is_eligible_for_analysis(&self, watermark: Option<DateTime<Utc>>) -> bool {
        matches!(self.kind, MessageKind::User)
            && !self.text.trim().is_empty()
            && watermark.is_none_or(|mark| self.source_timestamp > mark)
    }

    /// Merges a re-fetched copy of this message onto the stored one.
    ///
    /// A deleted message is immutable except for the deleted flag itself, so
    /// only that flag may change once `is_deleted` is set.
    #[must_use]
    pub fn merge_refetched(stored: &Self, incoming: Self) -> Self {
        if stored.is_deleted {
            let mut kept = stored.clone();
            kept.is_deleted = incoming.is_deleted;
            return kept;
        }
        incoming
    }
}
