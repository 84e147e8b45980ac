//! Domain model for channel connection lifecycle.
//!
//! The channel domain models the relationship between a project and an
//! external communication channel: validated identifiers, the connection
//! aggregate with its analysis watermark, and the sync-health snapshot
//! surfaced to callers.

mod connection;
mod error;
mod health;
mod ids;

pub use connection::{ChannelConnection, PersistedConnectionData};
pub use error::ChannelDomainError;
pub use health::SyncHealthSnapshot;
pub use ids::{ChannelId, ChannelName, ConnectionId, ProjectId, SyncInterval};
