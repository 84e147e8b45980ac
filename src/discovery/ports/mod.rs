//! Ports through which discovery services reach persistence, the
//! analysis engine, and project metadata.

mod analysis;
mod project_directory;
mod repository;

pub use analysis::{AnalysisEngine, AnalysisEngineError, MessageInput, ProjectContext};
pub use project_directory::{InMemoryProjectDirectory, ProjectDirectory};
pub use repository::{
    DerivedTaskRepository, DerivedTaskRepositoryError, DerivedTaskRepositoryResult,
};
