//! Adapters backing the discovery ports: in-memory and `PostgreSQL`
//! persistence plus the HTTP analysis engine client.

pub mod http;
pub mod memory;
pub mod postgres;

pub use http::HttpAnalysisEngine;
pub use memory::InMemoryDerivedTaskRepository;
pub use postgres::{DerivedTaskPgPool, PostgresDerivedTaskRepository};
