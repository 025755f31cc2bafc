//! Multi-step interactions.
//!
//! A flow that needs more than one round trip (token creation, ban, unban)
//! sends a prompt with buttons and registers a [`Pending`] entry keyed by the
//! prompt id. Button presses claim the entry; presses on unknown or stale
//! prompts, or from someone other than the requester, are rejected.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use watchpost_core::{PromptId, Role, SubscriberId};

use crate::error::AppError;
use crate::models::User;
use crate::transport::{Button, Keyboard};

/// Token validity choices offered in the interactive flow, in days.
pub const TOKEN_DAY_CHOICES: [u32; 4] = [1, 3, 7, 30];

/// Stage of the interactive token flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStage {
    /// Waiting for the role.
    PickRole,
    /// Role chosen, waiting for the validity.
    PickDuration {
        /// Chosen role.
        role: Role,
    },
}

/// The closed set of multi-step flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// `/token` without arguments.
    Token(TokenStage),
    /// `/ban`: pick an active user.
    Ban,
    /// `/unban`: pick a banned user.
    Unban,
}

impl Flow {
    /// Role required to act on a reply in this flow.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Token(_) => Role::Admin,
            Self::Ban | Self::Unban => Role::Mod,
        }
    }

    /// Zero-based stage ordinal.
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Token(TokenStage::PickDuration { .. }) => 1,
            Self::Token(TokenStage::PickRole) | Self::Ban | Self::Unban => 0,
        }
    }
}

/// A flow waiting for a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    /// Who started the flow.
    pub requester: SubscriberId,
    /// Flow and its accumulated data.
    pub flow: Flow,
}

/// How long a prompt stays answerable without any activity.
pub const PROMPT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    pending: Pending,
    touched: Instant,
}

/// Pending interactions keyed by prompt id.
///
/// A reply claims its entry: [`advance`](Self::advance) removes it, and a
/// flow with another step puts it back with [`update`](Self::update). Two
/// presses of the same button can therefore never both act.
#[derive(Debug)]
pub struct Interactions {
    pending: Mutex<HashMap<PromptId, Entry>>,
    ttl: Duration,
}

impl Default for Interactions {
    fn default() -> Self {
        Self::with_ttl(PROMPT_TTL)
    }
}

impl Interactions {
    /// Create an empty tracker with the default time-to-live.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tracker whose prompts go stale after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Register a flow started by `requester` with `prompt`.
    ///
    /// Stale entries are dropped on the way.
    pub async fn begin(&self, prompt: PromptId, requester: SubscriberId, flow: Flow) {
        debug!(%prompt, %requester, ?flow, "Interaction started");
        let now = Instant::now();
        let mut pending = self.pending.lock().await;

        let before = pending.len();
        pending.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        let dropped = before - pending.len();
        if dropped > 0 {
            debug!(dropped, "Dropped stale interactions");
        }

        pending.insert(
            prompt,
            Entry {
                pending: Pending { requester, flow },
                touched: now,
            },
        );
    }

    /// Claim the flow a reply belongs to.
    ///
    /// On success the entry is removed; call [`update`](Self::update) to
    /// keep the flow going.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnknownInteraction` if nothing live is pending for
    /// `prompt` or the reply comes from someone other than the requester. A
    /// reply from someone else leaves the entry in place.
    pub async fn advance(&self, prompt: PromptId, from: SubscriberId) -> Result<Pending, AppError> {
        let mut pending = self.pending.lock().await;
        let entry = *pending
            .get(&prompt)
            .ok_or(AppError::UnknownInteraction)?;

        if entry.touched.elapsed() >= self.ttl {
            pending.remove(&prompt);
            debug!(%prompt, "Reply to a stale prompt");
            return Err(AppError::UnknownInteraction);
        }
        if entry.pending.requester != from {
            debug!(%prompt, %from, "Reply from a different subscriber");
            return Err(AppError::UnknownInteraction);
        }

        pending.remove(&prompt);
        Ok(entry.pending)
    }

    /// Put a claimed flow back with its next stage.
    pub async fn update(&self, prompt: PromptId, requester: SubscriberId, flow: Flow) {
        self.pending.lock().await.insert(
            prompt,
            Entry {
                pending: Pending { requester, flow },
                touched: Instant::now(),
            },
        );
    }

    /// Drop a pending interaction without a reply.
    pub async fn complete(&self, prompt: PromptId) -> Option<Pending> {
        self.pending
            .lock()
            .await
            .remove(&prompt)
            .map(|entry| entry.pending)
    }

    /// Number of pending interactions.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

/// A button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// A role.
    Role(Role),
    /// A validity in days.
    Days(u32),
    /// A subscriber.
    Subscriber(SubscriberId),
    /// Abort the flow.
    Cancel,
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role:{role}"),
            Self::Days(days) => write!(f, "days:{days}"),
            Self::Subscriber(id) => write!(f, "user:{id}"),
            Self::Cancel => f.write_str("cancel"),
        }
    }
}

impl FromStr for Choice {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || AppError::BadRequest(format!("Unrecognized selection: {s}"));

        if s == "cancel" {
            return Ok(Self::Cancel);
        }
        let (kind, value) = s.split_once(':').ok_or_else(bad)?;
        match kind {
            "role" => value.parse().map(Self::Role).map_err(|_| bad()),
            "days" => value.parse().map(Self::Days).map_err(|_| bad()),
            "user" => value.parse().map(Self::Subscriber).map_err(|_| bad()),
            _ => Err(bad()),
        }
    }
}

fn cancel_row() -> Vec<Button> {
    vec![Button::new("Cancel", Choice::Cancel.to_string())]
}

/// One button per role, plus cancel.
#[must_use]
pub fn role_keyboard(roles: &[Role]) -> Keyboard {
    let row = roles
        .iter()
        .map(|role| Button::new(role.to_string(), Choice::Role(*role).to_string()))
        .collect();
    vec![row, cancel_row()]
}

/// One button per validity choice, plus cancel.
#[must_use]
pub fn days_keyboard() -> Keyboard {
    let row = TOKEN_DAY_CHOICES
        .iter()
        .map(|days| {
            let label = if *days == 1 {
                "1 day".to_string()
            } else {
                format!("{days} days")
            };
            Button::new(label, Choice::Days(*days).to_string())
        })
        .collect();
    vec![row, cancel_row()]
}

/// One row per user, plus cancel.
#[must_use]
pub fn user_keyboard(users: &[User]) -> Keyboard {
    users
        .iter()
        .map(|user| {
            vec![Button::new(
                user.to_string(),
                Choice::Subscriber(user.id).to_string(),
            )]
        })
        .chain(std::iter::once(cancel_row()))
        .collect()
}
