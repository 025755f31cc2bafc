//! Owner token generation.
//!
//! # Usage
//!
//! ```bash
//! watchpost-cli token generate --length 16
//! ```

use thiserror::Error;
use watchpost_bot::config::{ConfigError, validate_owner_secret};
use watchpost_core::generate_token_value;

/// Default length of generated owner tokens.
pub const DEFAULT_OWNER_TOKEN_LENGTH: usize = 16;

/// Random values are redrawn this many times before giving up.
const MAX_ATTEMPTS: usize = 8;

/// Errors that can occur while generating a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Requested length cannot pass validation.
    #[error("Token length must be at least {min} (got {got})")]
    TooShort {
        /// Minimum accepted length.
        min: usize,
        /// Requested length.
        got: usize,
    },

    /// No generated value passed validation.
    #[error("Could not generate a strong token: {0}")]
    Weak(#[from] ConfigError),
}

/// Generate an owner token that the bot will accept at startup.
///
/// # Errors
///
/// Returns `TokenError` if `length` is too short or no strong value was drawn.
pub fn generate_owner_token(length: usize) -> Result<String, TokenError> {
    const MIN_LENGTH: usize = 8;
    if length < MIN_LENGTH {
        return Err(TokenError::TooShort {
            min: MIN_LENGTH,
            got: length,
        });
    }

    let mut last_error = None;
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_token_value(length);
        match validate_owner_secret(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map_or(
        TokenError::TooShort {
            min: MIN_LENGTH,
            got: length,
        },
        TokenError::Weak,
    ))
}
