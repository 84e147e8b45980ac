//! `PostgreSQL` adapter for channel connection persistence.

mod models;
mod repository;
mod schema;

pub use repository::{ConnectionPgPool, PostgresConnectionRepository};
