//! Domain models for the bot.
//!
//! - [`user`] - Registered subscribers
//! - [`token`] - Activation tokens

pub mod token;
pub mod user;

pub use token::Token;
pub use user::User;
