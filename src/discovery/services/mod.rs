//! Application services for task discovery and triage.

mod pipeline;
mod triage;

pub use pipeline::{
    DEFAULT_BATCH_CAP, TaskDiscoveryError, TaskDiscoveryResult, TaskDiscoveryService,
};
pub use triage::{DerivedTaskService, DerivedTaskTriageError, DerivedTaskTriageResult};
