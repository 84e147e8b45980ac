//! Chantier: channel synchronization and task discovery for project
//! workspaces.
//!
//! This crate connects a project-management workspace to external
//! team-communication channels and continuously mines new messages for
//! actionable work items. Messages are fetched incrementally behind a
//! per-channel rate-limit breaker, persisted idempotently, and handed to an
//! external analysis engine whose candidate tasks flow through a human
//! approval lifecycle.
//!
//! # Architecture
//!
//! Chantier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`channel`]: Channel connection lifecycle and the channel API boundary
//! - [`message`]: Raw message records and idempotent message storage
//! - [`discovery`]: Derived-task candidates, approval state machine, and the
//!   analysis-engine boundary
//! - [`sync`]: The sync orchestrator, rate-limit breaker, and background
//!   scheduling

pub mod channel;
pub mod discovery;
pub mod message;
pub mod sync;
