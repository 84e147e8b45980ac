//! `PostgreSQL` persistence adapter for derived tasks.

mod models;
mod repository;
mod schema;

pub use repository::{DerivedTaskPgPool, PostgresDerivedTaskRepository};
