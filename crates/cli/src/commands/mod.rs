//! CLI command implementations.

pub mod config;
pub mod token;
