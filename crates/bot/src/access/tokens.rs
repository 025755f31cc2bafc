//! Activation token issuance and redemption.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use watchpost_core::{Role, SubscriberId, generate_token_value};

use crate::error::AppError;
use crate::models::{Token, User};

/// Upper bound on regeneration attempts when a value collides.
const MAX_COLLISION_RETRIES: usize = 32;

/// Owner bootstrap tokens are valid for one day.
const OWNER_TOKEN_DAYS: u32 = 1;

/// Live activation tokens, keyed by value.
#[derive(Debug)]
pub struct TokenIssuer {
    tokens: HashMap<String, Token>,
    owner_minted: bool,
    length: usize,
}

impl TokenIssuer {
    /// Create an issuer generating values of `length` characters.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            tokens: HashMap::new(),
            owner_minted: false,
            length,
        }
    }

    /// Issue a token for `role`, valid for `valid_for_days` days.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if no unique value could be generated.
    pub fn issue(&mut self, role: Role, valid_for_days: u32) -> Result<Token, AppError> {
        self.issue_at(role, valid_for_days, Utc::now())
    }

    pub(crate) fn issue_at(
        &mut self,
        role: Role,
        valid_for_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Token, AppError> {
        self.purge_expired_at(now);

        for attempt in 0..MAX_COLLISION_RETRIES {
            let value = generate_token_value(self.length);
            if self.tokens.contains_key(&value) {
                debug!(attempt, "Token value collision, regenerating");
                continue;
            }

            let token = Token::new(role, value, valid_for_days, now);
            self.tokens.insert(token.value.clone(), token.clone());
            info!(%role, valid_for_days, "Issued activation token");
            return Ok(token);
        }

        Err(AppError::Internal(
            "could not generate a unique token value".to_string(),
        ))
    }

    /// Register the fixed owner bootstrap token.
    ///
    /// Only the first call mints a token; later calls return `None`.
    pub fn issue_owner_token(&mut self, fixed_value: &str) -> Option<Token> {
        self.issue_owner_token_at(fixed_value, Utc::now())
    }

    pub(crate) fn issue_owner_token_at(
        &mut self,
        fixed_value: &str,
        now: DateTime<Utc>,
    ) -> Option<Token> {
        if self.owner_minted {
            return None;
        }
        self.owner_minted = true;

        let token = Token::new(Role::Owner, fixed_value.to_string(), OWNER_TOKEN_DAYS, now);
        if self
            .tokens
            .insert(token.value.clone(), token.clone())
            .is_some()
        {
            warn!("Owner token replaced an existing token with the same value");
        }
        info!("Registered owner bootstrap token");
        Some(token)
    }

    /// Redeem a token, returning the user it creates.
    ///
    /// `owner_present` tells the issuer whether an owner is already
    /// registered. A failed activation leaves the token in place.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidToken` if the value is unknown or expired
    /// - `AppError::OwnerExists` for an owner token while an owner exists
    pub fn activate(
        &mut self,
        value: &str,
        id: SubscriberId,
        display_name: &str,
        owner_present: bool,
    ) -> Result<User, AppError> {
        self.activate_at(value, id, display_name, owner_present, Utc::now())
    }

    pub(crate) fn activate_at(
        &mut self,
        value: &str,
        id: SubscriberId,
        display_name: &str,
        owner_present: bool,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        self.purge_expired_at(now);

        let role = self
            .tokens
            .get(value)
            .map(|token| token.role)
            .ok_or(AppError::InvalidToken)?;

        if role == Role::Owner && owner_present {
            return Err(AppError::OwnerExists);
        }

        self.tokens.remove(value);
        info!(subscriber = %id, %role, "Token redeemed");
        Ok(User::new(id, display_name, role))
    }

    /// Drop every expired token. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub(crate) fn purge_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired_at(now));
        let purged = before - self.tokens.len();
        if purged > 0 {
            debug!(purged, "Purged expired tokens");
        }
        purged
    }

    /// Remove a single token. Returns whether it existed.
    pub fn revoke(&mut self, value: &str) -> bool {
        self.tokens.remove(value).is_some()
    }

    /// Remove every live token. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.tokens.len();
        self.tokens.clear();
        cleared
    }

    /// Live tokens, soonest expiry first.
    #[must_use]
    pub fn live(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.tokens.values().cloned().collect();
        tokens.sort_by_key(|token| token.expires_at);
        tokens
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use watchpost_core::is_token_value;

    use super::*;

    const OWNER_VALUE: &str = "OWNERKEY42";

    #[test]
    fn test_issue_registers_token() {
        let mut issuer = TokenIssuer::new(8);
        let token = issuer.issue(Role::Sub, 3).unwrap();

        assert_eq!(token.value.len(), 8);
        assert!(is_token_value(&token.value));
        assert_eq!(issuer.live(), vec![token]);
    }

    #[test]
    fn test_issued_values_are_unique() {
        // A 1-character alphabet of 36 values forces collisions quickly.
        let mut issuer = TokenIssuer::new(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            if let Ok(token) = issuer.issue(Role::Sub, 1) {
                assert!(seen.insert(token.value));
            }
        }
        assert_eq!(issuer.live().len(), seen.len());
    }

    #[test]
    fn test_owner_token_minted_once() {
        let mut issuer = TokenIssuer::new(8);
        let first = issuer.issue_owner_token(OWNER_VALUE).unwrap();
        assert_eq!(first.role, Role::Owner);
        assert!(issuer.issue_owner_token(OWNER_VALUE).is_none());
        assert!(issuer.issue_owner_token("OTHERKEY99").is_none());
        assert_eq!(issuer.live().len(), 1);
    }

    #[test]
    fn test_owner_token_not_reminted_after_use() {
        let mut issuer = TokenIssuer::new(8);
        issuer.issue_owner_token(OWNER_VALUE).unwrap();
        issuer
            .activate(OWNER_VALUE, SubscriberId::new(1), "owner", false)
            .unwrap();
        assert!(issuer.issue_owner_token(OWNER_VALUE).is_none());
    }

    #[test]
    fn test_activate_consumes_token() {
        let mut issuer = TokenIssuer::new(8);
        let token = issuer.issue(Role::Mod, 1).unwrap();

        let user = issuer
            .activate(&token.value, SubscriberId::new(7), "alice", true)
            .unwrap();
        assert_eq!(user.role, Role::Mod);
        assert_eq!(user.name, "alice");

        assert!(matches!(
            issuer.activate(&token.value, SubscriberId::new(8), "bob", true),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_activate_expired_token_is_purged() {
        let now = Utc::now();
        let mut issuer = TokenIssuer::new(8);
        let token = issuer.issue_at(Role::Sub, 1, now).unwrap();

        let later = now + Duration::days(1);
        assert!(matches!(
            issuer.activate_at(&token.value, SubscriberId::new(7), "alice", false, later),
            Err(AppError::InvalidToken)
        ));
        assert!(issuer.live().is_empty());
    }

    #[test]
    fn test_second_owner_rejected_without_consuming() {
        let mut issuer = TokenIssuer::new(8);
        issuer.issue_owner_token(OWNER_VALUE).unwrap();

        assert!(matches!(
            issuer.activate(OWNER_VALUE, SubscriberId::new(2), "mallory", true),
            Err(AppError::OwnerExists)
        ));
        assert_eq!(issuer.live().len(), 1);
    }

    #[test]
    fn test_revoke_and_clear() {
        let mut issuer = TokenIssuer::new(8);
        let a = issuer.issue(Role::Sub, 1).unwrap();
        issuer.issue(Role::Mod, 1).unwrap();
        issuer.issue(Role::Admin, 1).unwrap();

        assert!(issuer.revoke(&a.value));
        assert!(!issuer.revoke(&a.value));
        assert_eq!(issuer.clear_all(), 2);
        assert!(issuer.live().is_empty());
    }

    #[test]
    fn test_purge_expired_counts() {
        let now = Utc::now();
        let mut issuer = TokenIssuer::new(8);
        issuer.issue_at(Role::Sub, 1, now).unwrap();
        issuer.issue_at(Role::Sub, 7, now).unwrap();

        assert_eq!(issuer.purge_expired_at(now + Duration::days(2)), 1);
        assert_eq!(issuer.live().len(), 1);
    }
}
