//! Tuning knobs for sync cycles and the discovery pipeline.

use crate::discovery::domain::ConfidenceScore;
use crate::discovery::services::DEFAULT_BATCH_CAP;
use std::time::Duration;

/// Page size requested from the channel API per fetch call.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// How long a throttled channel stays blocked when the upstream does not
/// say otherwise.
pub const DEFAULT_THROTTLE_COOLDOWN: Duration = Duration::from_secs(300);

/// Settings shared by the orchestrator, breaker, and discovery pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    /// Messages requested per channel API page.
    pub page_limit: u32,
    /// Messages sent to the analysis engine per call.
    pub batch_cap: usize,
    /// Minimum confidence for a candidate to become a suggestion.
    pub confidence_floor: ConfidenceScore,
    /// Fallback cooldown after an upstream throttle without `Retry-After`.
    pub throttle_cooldown: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            batch_cap: DEFAULT_BATCH_CAP,
            confidence_floor: ConfidenceScore::DEFAULT_FLOOR,
            throttle_cooldown: DEFAULT_THROTTLE_COOLDOWN,
        }
    }
}
