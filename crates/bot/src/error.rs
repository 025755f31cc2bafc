//! Unified error handling for the bot.
//!
//! Every command and reply handler returns `Result<_, AppError>`. Errors are
//! recovered at the handler boundary: [`AppError::report`] logs them and
//! [`AppError::user_message`] turns them into chat text. Nothing here is
//! allowed to take the process down.

use std::future::Future;

use sentry::{Hub, SentryFuture, SentryFutureExt};
use thiserror::Error;

use crate::hardware::CameraError;
use crate::transport::TransportError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requester is banned or lacks the required role.
    #[error("Unauthorized")]
    Unauthorized,

    /// Activation token is absent, expired, or malformed.
    #[error("Invalid token")]
    InvalidToken,

    /// An owner token was redeemed while an owner already exists.
    #[error("An owner is already registered")]
    OwnerExists,

    /// Reply refers to a stale or forged interaction.
    #[error("Unknown interaction")]
    UnknownInteraction,

    /// Target identity is not in the expected set.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested state change is a no-op.
    #[error("Already in state: {0}")]
    AlreadyInState(String),

    /// Malformed command arguments or reply payload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Messaging transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Camera driver failed.
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for failures on our side rather than the requester's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Camera(_) | Self::Internal(_)
        )
    }

    /// Text shown to the requester.
    ///
    /// Server-side details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized!".to_string(),
            Self::InvalidToken => "This token is invalid or has expired.".to_string(),
            Self::OwnerExists => "This bot already has an owner.".to_string(),
            Self::UnknownInteraction => "This selection has expired.".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::AlreadyInState(message) | Self::BadRequest(message) => message.clone(),
            Self::Transport(_) | Self::Camera(_) | Self::Internal(_) => {
                "Something went wrong, please try again later.".to_string()
            }
        }
    }

    /// Log the error at a level matching its origin.
    ///
    /// Server errors are captured with Sentry; requester errors are routine and
    /// only logged at debug level.
    pub fn report(&self, context: &str) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                context,
                "Handler error"
            );
        } else {
            tracing::debug!(error = %self, context, "Request rejected");
        }
    }
}

/// Run `future` on its own Sentry hub forked from the current one.
///
/// Scope changes made while handling one update, such as the user set by
/// [`set_sentry_user`], stay with that update's events.
pub fn with_request_hub<F: Future>(future: F) -> SentryFuture<F> {
    future.bind_hub(Hub::new_from_top(Hub::current()))
}

/// Set the Sentry user context from a subscriber.
pub fn set_sentry_user(subscriber_id: i64, name: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(subscriber_id.to_string()),
            username: Some(name.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
