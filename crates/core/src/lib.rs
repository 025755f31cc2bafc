//! Watchpost Core - Shared types library.
//!
//! This crate provides common types used across all Watchpost components:
//! - `bot` - Surveillance controller and Telegram front-end
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! network clients, no hardware access. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Privilege roles, type-safe IDs, and activation token values

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
