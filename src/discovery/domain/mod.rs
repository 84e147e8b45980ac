//! Domain model for task discovery: analysis candidates and the
//! derived-task approval lifecycle.

mod candidate;
mod derived_task;
mod error;
mod ids;

pub use candidate::{ConfidenceScore, TaskCandidate};
pub use derived_task::{DerivedTask, DerivedTaskStatus, PersistedDerivedTaskData};
pub use error::{DiscoveryDomainError, ParseDerivedTaskStatusError};
pub use ids::{DerivedTaskId, WorkspaceTaskId};
