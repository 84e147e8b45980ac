//! Incremental channel sync: the cycle orchestrator, its rate-limit
//! breaker, and background scheduling.
//!
//! The watermark on each connection makes cycles incremental; it only
//! advances after fetch, persistence, and analysis have all succeeded,
//! so a failed cycle is re-covered by the next one.

pub mod breaker;
pub mod orchestrator;
pub mod outcome;
pub mod scheduler;
pub mod settings;

pub use breaker::RateLimitBreaker;
pub use orchestrator::{SyncError, SyncOrchestrator, SyncResult};
pub use outcome::{ChannelSyncHealth, SyncCycleOutcome, SyncCycleStatus};
pub use scheduler::SyncScheduler;
pub use settings::{DEFAULT_PAGE_LIMIT, DEFAULT_THROTTLE_COOLDOWN, SyncSettings};

#[cfg(test)]
mod tests;
