//! Subscriber privilege roles.
//!
//! Roles form a total order: `Open < Sub < Mod < Admin < Owner`. Every
//! required-privilege check in the bot compares against this scale.

use serde::{Deserialize, Serialize};

/// Error returned when a role name or flag cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Privilege level of a subscriber.
///
/// The discriminant is the rank; the derived `Ord` compares by rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Anyone, registered or not.
    #[default]
    Open = 0,
    /// Receives alerts.
    Sub = 1,
    /// Can inspect and ban subscribers.
    Mod = 2,
    /// Receives footage, issues tokens, pauses surveillance.
    Admin = 3,
    /// The single bootstrap operator.
    Owner = 4,
}

impl Role {
    /// Lowest privilege level.
    pub const MIN: Self = Self::Open;
    /// Highest privilege level.
    pub const MAX: Self = Self::Owner;
    /// All roles, lowest first.
    pub const ALL: [Self; 5] = [Self::Open, Self::Sub, Self::Mod, Self::Admin, Self::Owner];

    /// Numeric rank of this role.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Look up a role by rank.
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Open),
            1 => Some(Self::Sub),
            2 => Some(Self::Mod),
            3 => Some(Self::Admin),
            4 => Some(Self::Owner),
            _ => None,
        }
    }

    /// Parse a token-command flag (`-s`, `-m`, `-a`).
    ///
    /// # Errors
    ///
    /// Returns `RoleParseError` for any other input. There is deliberately no
    /// flag for `Open` or `Owner`.
    pub fn from_flag(flag: &str) -> Result<Self, RoleParseError> {
        match flag {
            "-s" => Ok(Self::Sub),
            "-m" => Ok(Self::Mod),
            "-a" => Ok(Self::Admin),
            _ => Err(RoleParseError(flag.to_owned())),
        }
    }

    /// Roles strictly below `self`, lowest first.
    pub fn lower(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |role| *role < self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Sub => "sub",
            Self::Mod => "mod",
            Self::Admin => "admin",
            Self::Owner => "owner",
        };
        // `pad` keeps width specifiers like `{:6}` working.
        f.pad(name)
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "sub" | "subscriber" => Ok(Self::Sub),
            "mod" | "moderator" => Ok(Self::Mod),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
