//! Task discovery: analysis of synced messages and the approval
//! lifecycle of the tasks derived from them.
//!
//! Candidates come back from an analysis engine, are filtered by a
//! confidence floor, deduplicated against their source messages, and
//! stored as suggested tasks. A suggestion is then accepted or rejected,
//! and an accepted one is finalized once a workspace task exists for it.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
