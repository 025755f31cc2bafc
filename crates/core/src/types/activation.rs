//! Activation token values.
//!
//! Token values are short strings over uppercase ASCII letters and digits.
//! With a length of 8 there are 36^8 (about 2.8 trillion) possible values.

use rand::seq::IndexedRandom;

/// Alphabet used for generated token values.
pub const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random token value of `length` characters.
#[must_use]
pub fn generate_token_value(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| TOKEN_CHARSET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Returns true if `value` only uses characters from [`TOKEN_CHARSET`].
#[must_use]
pub fn is_token_value(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| TOKEN_CHARSET.contains(&b))
}
