//! Adapter implementations of the channel ports.

pub mod http;
pub mod memory;
pub mod postgres;
