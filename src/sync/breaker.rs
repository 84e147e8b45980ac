//! Rate-limit circuit breaker for channel fetches.

use crate::channel::domain::ChannelId;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Per-channel breaker that blocks fetches until an upstream throttle
/// window has passed.
///
/// The breaker is binary and time-based: a recorded throttle opens it
/// until a deadline, and any check at or past the deadline closes it
/// again. There is no half-open probing.
pub struct RateLimitBreaker<C>
where
    C: Clock + Send + Sync,
{
    open_until: Mutex<HashMap<ChannelId, DateTime<Utc>>>,
    default_cooldown: Duration,
    clock: Arc<C>,
}

impl<C> RateLimitBreaker<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a breaker with the given fallback cooldown.
    #[must_use]
    pub fn new(clock: Arc<C>, default_cooldown: Duration) -> Self {
        Self {
            open_until: Mutex::new(HashMap::new()),
            default_cooldown,
            clock,
        }
    }

    /// Opens the breaker for a channel.
    ///
    /// Honours the upstream `retry_after` hint when present, otherwise
    /// falls back to the configured cooldown.
    pub fn record_throttled(&self, channel_id: &ChannelId, retry_after: Option<Duration>) {
        let cooldown = retry_after.unwrap_or(self.default_cooldown);
        let window = TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX);
        let deadline = self
            .clock
            .utc()
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut open_until = self
            .open_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        open_until.insert(channel_id.clone(), deadline);
    }

    /// Returns whether fetches for the channel are currently blocked.
    ///
    /// An expired entry is removed on the way out, so the breaker holds
    /// state only for channels throttled recently.
    #[must_use]
    pub fn is_open(&self, channel_id: &ChannelId) -> bool {
        let now = self.clock.utc();
        let mut open_until = self
            .open_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match open_until.get(channel_id) {
            Some(deadline) if now < *deadline => true,
            Some(_) => {
                open_until.remove(channel_id);
                false
            }
            None => false,
        }
    }
}
