//! Adapter implementations of the message ports.

pub mod memory;
pub mod postgres;
