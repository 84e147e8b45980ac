//! Channel connection lifecycle and the channel API boundary.
//!
//! A connection ties one project to one external channel and carries the
//! sync metadata the orchestrator depends on: the analysis watermark, the
//! configured cadence, and the health of the most recent cycle. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
