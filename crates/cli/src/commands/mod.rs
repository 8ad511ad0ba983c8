//! CLI command implementations.

pub mod orders;
pub mod session;
