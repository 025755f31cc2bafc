//! Registered and banned subscribers.

use std::collections::BTreeMap;

use watchpost_core::{Role, SubscriberId};

use crate::models::User;

/// Two disjoint sets of users: active and banned.
///
/// An identity is in at most one set. Only [`ban`](Self::ban) and
/// [`unban`](Self::unban) move users between them.
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    active: BTreeMap<SubscriberId, User>,
    banned: BTreeMap<SubscriberId, User>,
}

impl UserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an active user.
    ///
    /// Banned identities are left alone; returns false in that case.
    pub fn upsert(&mut self, user: User) -> bool {
        if self.banned.contains_key(&user.id) {
            return false;
        }
        self.active.insert(user.id, user);
        true
    }

    /// Remove an active user. Never touches the banned set.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Look up an active user.
    #[must_use]
    pub fn get(&self, id: SubscriberId) -> Option<&User> {
        self.active.get(&id)
    }

    /// Move a user from active to banned. Returns false if not active.
    pub fn ban(&mut self, id: SubscriberId) -> bool {
        match self.active.remove(&id) {
            Some(user) => {
                self.banned.insert(id, user);
                true
            }
            None => false,
        }
    }

    /// Move a user from banned back to active. Returns false if not banned.
    pub fn unban(&mut self, id: SubscriberId) -> bool {
        match self.banned.remove(&id) {
            Some(user) => {
                self.active.insert(id, user);
                true
            }
            None => false,
        }
    }

    /// Whether `id` is banned.
    #[must_use]
    pub fn is_banned(&self, id: SubscriberId) -> bool {
        self.banned.contains_key(&id)
    }

    /// Active users whose role satisfies `pred`, ordered by id.
    pub fn filter(&self, pred: impl Fn(Role) -> bool) -> Vec<User> {
        self.active
            .values()
            .filter(|user| pred(user.role))
            .cloned()
            .collect()
    }

    /// Active users with role `>= role`.
    #[must_use]
    pub fn at_least(&self, role: Role) -> Vec<User> {
        self.filter(|r| r >= role)
    }

    /// Active users with role `<= role`.
    #[must_use]
    pub fn at_most(&self, role: Role) -> Vec<User> {
        self.filter(|r| r <= role)
    }

    /// Active users with role `< role`.
    #[must_use]
    pub fn below(&self, role: Role) -> Vec<User> {
        self.filter(|r| r < role)
    }

    /// Active users with role `> role`.
    #[must_use]
    pub fn above(&self, role: Role) -> Vec<User> {
        self.filter(|r| r > role)
    }

    /// All banned users, ordered by id.
    #[must_use]
    pub fn banned(&self) -> Vec<User> {
        self.banned.values().cloned().collect()
    }

    /// The owner, if one has activated.
    #[must_use]
    pub fn owner(&self) -> Option<&User> {
        self.active.values().find(|user| user.role == Role::Owner)
    }

    /// Number of active users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether there are no active users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Clear both sets, keeping only the owner.
    ///
    /// Returns the active users that were removed.
    pub fn reset_keep_owner(&mut self) -> Vec<User> {
        let owner = self
            .owner()
            .map(|user| user.id)
            .and_then(|id| self.active.remove(&id));

        let removed = std::mem::take(&mut self.active).into_values().collect();
        self.banned.clear();

        if let Some(owner) = owner {
            self.active.insert(owner.id, owner);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> User {
        User::new(SubscriberId::new(id), format!("user{id}"), role)
    }

    fn populated() -> UserDirectory {
        let mut directory = UserDirectory::new();
        directory.upsert(user(1, Role::Owner));
        directory.upsert(user(2, Role::Admin));
        directory.upsert(user(3, Role::Mod));
        directory.upsert(user(4, Role::Sub));
        directory
    }

    fn ids(users: &[User]) -> Vec<i64> {
        users.iter().map(|u| u.id.as_i64()).collect()
    }

    #[test]
    fn test_threshold_queries() {
        let directory = populated();
        assert_eq!(ids(&directory.at_least(Role::Admin)), vec![1, 2]);
        assert_eq!(ids(&directory.at_most(Role::Mod)), vec![3, 4]);
        assert_eq!(ids(&directory.below(Role::Mod)), vec![4]);
        assert_eq!(ids(&directory.above(Role::Mod)), vec![1, 2]);
    }

    #[test]
    fn test_ban_unban_roundtrip() {
        let mut directory = populated();
        let before = directory.get(SubscriberId::new(3)).cloned();

        assert!(directory.ban(SubscriberId::new(3)));
        assert!(directory.is_banned(SubscriberId::new(3)));
        assert!(directory.get(SubscriberId::new(3)).is_none());

        assert!(directory.unban(SubscriberId::new(3)));
        assert!(!directory.is_banned(SubscriberId::new(3)));
        assert_eq!(directory.get(SubscriberId::new(3)).cloned(), before);
    }

    #[test]
    fn test_ban_requires_active() {
        let mut directory = populated();
        assert!(!directory.ban(SubscriberId::new(99)));
        assert!(!directory.unban(SubscriberId::new(4)));
    }

    #[test]
    fn test_remove_never_touches_banned() {
        let mut directory = populated();
        directory.ban(SubscriberId::new(4));
        assert!(!directory.remove(SubscriberId::new(4)));
        assert!(directory.is_banned(SubscriberId::new(4)));
    }

    #[test]
    fn test_upsert_keeps_ban() {
        let mut directory = populated();
        directory.ban(SubscriberId::new(4));

        assert!(!directory.upsert(user(4, Role::Mod)));
        assert!(directory.is_banned(SubscriberId::new(4)));
        assert!(directory.get(SubscriberId::new(4)).is_none());
    }

    #[test]
    fn test_reset_keeps_owner() {
        let mut directory = populated();
        directory.ban(SubscriberId::new(4));

        let removed = directory.reset_keep_owner();

        assert_eq!(ids(&removed), vec![2, 3]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.owner().map(|u| u.id.as_i64()), Some(1));
        assert!(directory.banned().is_empty());
    }

    #[test]
    fn test_reset_without_owner() {
        let mut directory = UserDirectory::new();
        directory.upsert(user(2, Role::Admin));
        assert_eq!(directory.reset_keep_owner().len(), 1);
        assert!(directory.is_empty());
    }
}
