//! Subscriber domain type.

use watchpost_core::{Role, SubscriberId};

/// A registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Telegram chat id.
    pub id: SubscriberId,
    /// Display name at activation time.
    pub name: String,
    /// Privilege level granted by the redeemed token.
    pub role: Role,
}

impl User {
    /// Create a new user.
    #[must_use]
    pub fn new(id: SubscriberId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:14} [ {:6} ]", self.name, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_columns() {
        let user = User::new(SubscriberId::new(123), "username", Role::Admin);
        assert_eq!(user.to_string(), "username       [ admin  ]");
    }
}
