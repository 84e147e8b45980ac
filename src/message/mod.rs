//! Raw message records and idempotent message storage.
//!
//! Every fetched message is persisted here before analysis runs, including
//! messages the eligibility filter later excludes, so channel history stays
//! complete for audit. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
