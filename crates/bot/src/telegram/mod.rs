//! Telegram front-end.
//!
//! This module provides:
//! - [`TelegramClient`], the [`Transport`](crate::transport::Transport)
//!   implementation over the Bot API
//! - Bot API types for updates and inline keyboards
//! - The long-polling loop that turns updates into handler calls

mod client;
mod error;
mod types;
mod updates;

pub use client::{POLL_TIMEOUT_SECS, TelegramClient};
pub use error::TelegramError;
pub use types::{CallbackQuery, Chat, Message, TgUser, Update};
pub use updates::{command_from_message, inbound_from_update, reply_from_callback, run_polling};
