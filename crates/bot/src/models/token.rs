//! Activation token domain type.

use chrono::{DateTime, Duration, Utc};
use watchpost_core::Role;

/// A single-use activation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Role granted when the token is redeemed.
    pub role: Role,
    /// Token value the subscriber sends with `/activate`.
    pub value: String,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Create a token valid for `valid_for_days` days from `now`.
    #[must_use]
    pub fn new(role: Role, value: String, valid_for_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            role,
            value,
            expires_at: now + Duration::days(i64::from(valid_for_days)),
        }
    }

    /// Returns true if this token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let token = Token::new(Role::Sub, "AB12CD34".to_string(), 1, now);

        assert!(!token.is_expired_at(now));
        assert!(!token.is_expired_at(now + Duration::hours(23)));
        assert!(token.is_expired_at(now + Duration::days(1)));
    }

    #[test]
    fn test_zero_days_is_already_expired() {
        let now = Utc::now();
        let token = Token::new(Role::Sub, "AB12CD34".to_string(), 0, now);
        assert!(token.is_expired_at(now));
    }
}
