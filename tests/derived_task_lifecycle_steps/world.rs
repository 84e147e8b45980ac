//! Shared world state for derived-task lifecycle BDD scenarios.

use std::sync::Arc;

use chantier::channel::domain::{ChannelId, ProjectId};
use chantier::discovery::{
    adapters::memory::InMemoryDerivedTaskRepository,
    domain::{DerivedTask, DerivedTaskId},
    services::{DerivedTaskService, DerivedTaskTriageError},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTriageService = DerivedTaskService<InMemoryDerivedTaskRepository, DefaultClock>;

/// Scenario world for derived-task lifecycle behaviour tests.
pub struct DerivedTaskWorld {
    pub repository: Arc<InMemoryDerivedTaskRepository>,
    pub service: TestTriageService,
    pub project_id: ProjectId,
    pub channel_id: ChannelId,
    pub suggestion_id: Option<DerivedTaskId>,
    pub last_result: Option<Result<DerivedTask, DerivedTaskTriageError>>,
}

impl DerivedTaskWorld {
    /// Creates a world with empty pending scenario state.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryDerivedTaskRepository::new());
        let service = DerivedTaskService::new(Arc::clone(&repository), Arc::new(DefaultClock));

        Self {
            repository,
            service,
            project_id: ProjectId::new(),
            channel_id: ChannelId::new("C0001").expect("valid channel id"),
            suggestion_id: None,
            last_result: None,
        }
    }

    /// Returns the seeded suggestion identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when no suggestion was seeded.
    pub fn suggestion_id(&self) -> Result<DerivedTaskId, eyre::Report> {
        self.suggestion_id
            .ok_or_else(|| eyre::eyre!("missing suggestion in scenario world"))
    }
}

impl Default for DerivedTaskWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DerivedTaskWorld {
    DerivedTaskWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
