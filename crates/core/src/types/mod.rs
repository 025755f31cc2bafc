//! Core types for Watchpost.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod activation;
pub mod id;
pub mod role;

pub use activation::{TOKEN_CHARSET, generate_token_value, is_token_value};
pub use id::*;
pub use role::{Role, RoleParseError};
