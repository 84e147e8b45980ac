//! Port contracts for channel connections and the upstream channel API.

pub mod channel_api;
pub mod repository;
pub mod sync_trigger;

pub use channel_api::{ChannelApi, ChannelApiError, MessagePage};
pub use repository::{ConnectionRepository, ConnectionRepositoryError, ConnectionRepositoryResult};
pub use sync_trigger::SyncTrigger;
