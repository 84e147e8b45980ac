//! Lookup port for project metadata supplied to the analysis engine.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::analysis::ProjectContext;
use crate::channel::domain::ProjectId;

/// Resolves project metadata for analysis prompts.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Returns the project's context, or `None` when unknown.
    async fn project_context(&self, project_id: ProjectId) -> Option<ProjectContext>;
}

/// In-memory directory for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryProjectDirectory {
    projects: RwLock<HashMap<ProjectId, ProjectContext>>,
}

impl InMemoryProjectDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a project's context.
    pub fn insert(&self, project_id: ProjectId, context: ProjectContext) {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects.insert(project_id, context);
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn project_context(&self, project_id: ProjectId) -> Option<ProjectContext> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects.get(&project_id).cloned()
    }
}
