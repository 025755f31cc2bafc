//! Access control: who is registered, at which role, and how they got there.
//!
//! [`Registry`] owns the user directory and the token issuer behind their own
//! locks. Activation locks the issuer first, then the directory; every other
//! operation takes a single lock.

mod directory;
mod gate;
mod tokens;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, instrument};
use watchpost_core::{Role, SubscriberId};

pub use directory::UserDirectory;
pub use gate::is_authorized;
pub use tokens::TokenIssuer;

use crate::error::AppError;
use crate::models::{Token, User};

/// Lock-guarded access-control state shared by handlers and notifications.
#[derive(Debug)]
pub struct Registry {
    users: RwLock<UserDirectory>,
    tokens: Mutex<TokenIssuer>,
}

impl Registry {
    /// Create an empty registry generating tokens of `token_length` characters.
    #[must_use]
    pub fn new(token_length: usize) -> Self {
        Self {
            users: RwLock::new(UserDirectory::new()),
            tokens: Mutex::new(TokenIssuer::new(token_length)),
        }
    }

    /// Mint the owner bootstrap token. Only the first call has an effect.
    pub async fn bootstrap_owner(&self, fixed_value: &str) -> Option<Token> {
        self.tokens.lock().await.issue_owner_token(fixed_value)
    }

    /// See [`is_authorized`].
    pub async fn is_authorized(&self, id: SubscriberId, required: Role) -> bool {
        is_authorized(&*self.users.read().await, id, required)
    }

    /// Like [`Registry::is_authorized`], but as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when the check fails.
    pub async fn authorize(&self, id: SubscriberId, required: Role) -> Result<(), AppError> {
        if self.is_authorized(id, required).await {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    /// Redeem a token and register the resulting user.
    ///
    /// # Errors
    ///
    /// - `AppError::Unauthorized` if `id` is banned
    /// - `AppError::InvalidToken` for unknown or expired tokens
    /// - `AppError::OwnerExists` for an owner token while an owner exists
    /// - `AppError::AlreadyInState` if the owner tries to re-activate
    #[instrument(skip(self, value, display_name), fields(subscriber = %id))]
    pub async fn activate(
        &self,
        value: &str,
        id: SubscriberId,
        display_name: &str,
    ) -> Result<User, AppError> {
        let mut tokens = self.tokens.lock().await;
        let mut users = self.users.write().await;

        // Checked under the write lock so a concurrent ban cannot be undone.
        if users.is_banned(id) {
            return Err(AppError::Unauthorized);
        }

        // Redeeming another token would demote the owner.
        if users.owner().is_some_and(|owner| owner.id == id) {
            return Err(AppError::AlreadyInState(
                "You are already the owner.".to_string(),
            ));
        }

        let owner_present = users.owner().is_some();
        let user = tokens.activate(value, id, display_name, owner_present)?;
        users.upsert(user.clone());

        info!(role = %user.role, "Subscriber activated");
        Ok(user)
    }

    /// Issue a token for `role`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if no unique value could be generated.
    pub async fn issue_token(&self, role: Role, valid_for_days: u32) -> Result<Token, AppError> {
        self.tokens.lock().await.issue(role, valid_for_days)
    }

    /// Revoke every live token. Returns how many were removed.
    pub async fn clear_tokens(&self) -> usize {
        self.tokens.lock().await.clear_all()
    }

    /// Live tokens, soonest expiry first.
    pub async fn live_tokens(&self) -> Vec<Token> {
        let mut tokens = self.tokens.lock().await;
        tokens.purge_expired();
        tokens.live()
    }

    /// Read access to the directory.
    pub async fn users(&self) -> RwLockReadGuard<'_, UserDirectory> {
        self.users.read().await
    }

    /// Write access to the directory.
    pub async fn users_mut(&self) -> RwLockWriteGuard<'_, UserDirectory> {
        self.users.write().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const OWNER_VALUE: &str = "OWNERKEY42";

    #[tokio::test]
    async fn test_owner_bootstrap_and_activation() {
        let registry = Registry::new(8);
        registry.bootstrap_owner(OWNER_VALUE).await.unwrap();

        let owner = registry
            .activate(OWNER_VALUE, SubscriberId::new(1), "owner")
            .await
            .unwrap();
        assert_eq!(owner.role, Role::Owner);
        assert!(registry.is_authorized(owner.id, Role::Owner).await);
    }

    #[tokio::test]
    async fn test_second_owner_rejected() {
        let registry = Registry::new(8);
        registry.users_mut().await.upsert(User::new(
            SubscriberId::new(1),
            "owner",
            Role::Owner,
        ));
        registry.bootstrap_owner(OWNER_VALUE).await.unwrap();

        assert!(matches!(
            registry
                .activate(OWNER_VALUE, SubscriberId::new(2), "mallory")
                .await,
            Err(AppError::OwnerExists)
        ));
        assert_eq!(registry.users().await.at_least(Role::Owner).len(), 1);
        assert!(registry.users().await.get(SubscriberId::new(2)).is_none());
    }

    #[tokio::test]
    async fn test_owner_cannot_reactivate() {
        let registry = Registry::new(8);
        registry.bootstrap_owner(OWNER_VALUE).await.unwrap();
        registry
            .activate(OWNER_VALUE, SubscriberId::new(1), "owner")
            .await
            .unwrap();
        let token = registry.issue_token(Role::Sub, 1).await.unwrap();

        assert!(matches!(
            registry
                .activate(&token.value, SubscriberId::new(1), "owner")
                .await,
            Err(AppError::AlreadyInState(_))
        ));
        assert_eq!(registry.live_tokens().await.len(), 1);
    }

    #[tokio::test]
    async fn test_banned_id_cannot_activate() {
        let registry = Registry::new(8);
        let id = SubscriberId::new(50);
        {
            let mut users = registry.users_mut().await;
            users.upsert(User::new(id, "banned", Role::Sub));
            users.ban(id);
        }
        let token = registry.issue_token(Role::Mod, 1).await.unwrap();

        assert!(matches!(
            registry.activate(&token.value, id, "banned").await,
            Err(AppError::Unauthorized)
        ));
        assert!(registry.users().await.is_banned(id));
        assert!(registry.users().await.get(id).is_none());
        assert_eq!(registry.live_tokens().await, vec![token]);
    }

    #[tokio::test]
    async fn test_authorize_maps_to_error() {
        let registry = Registry::new(8);
        assert!(registry.authorize(SubscriberId::new(9), Role::Open).await.is_ok());
        assert!(matches!(
            registry.authorize(SubscriberId::new(9), Role::Sub).await,
            Err(AppError::Unauthorized)
        ));
    }
}
