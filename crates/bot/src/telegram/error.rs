//! Telegram-related errors.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur when talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Telegram response error: {0}")]
    Response(String),

    /// The Bot API returned `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),

    /// A file to upload could not be read.
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        let e = e.without_url();
        if e.is_decode() {
            Self::Response(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl From<TelegramError> for TransportError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Request(msg) | TelegramError::Response(msg) => Self::Delivery(msg),
            TelegramError::Api(msg) => Self::Api(msg),
            TelegramError::Io(e) => Self::Io(e),
        }
    }
}
