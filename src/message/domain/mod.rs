//! Domain model for raw channel messages.
//!
//! Message records keep the complete fetch history for audit: every fetched
//! message is persisted, including those the eligibility filter later
//! excludes from analysis.

mod error;
mod record;

pub use error::{MessageDomainError, ParseMessageKindError};
pub use record::{MessageId, MessageKind, MessageRecord};
