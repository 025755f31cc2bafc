//! Watchpost bot library.
//!
//! A motion-triggered surveillance controller with a Telegram front-end.
//! The sensor drives a recording state machine; finished recordings and
//! alerts go out to subscribers, who are managed through role-gated commands
//! and short-lived activation tokens.
//!
//! # Layout
//!
//! - [`access`] - user directory, token issuer, authorization gate
//! - [`services`] - recording state machine, notifications, pending flows
//! - [`handlers`] - command and reply entry points
//! - [`transport`] / [`telegram`] - messaging boundary and Bot API client
//! - [`hardware`] - camera and motion sensor adapters
//!
//! All state is in memory and lost on restart.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hardware;
pub mod models;
pub mod services;
pub mod state;
pub mod telegram;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;

pub use error::AppError;
pub use state::AppState;
