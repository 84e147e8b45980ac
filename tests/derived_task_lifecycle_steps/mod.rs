//! Step definitions for derived-task lifecycle behaviour tests.

pub mod then;
pub mod when;
pub mod world;
