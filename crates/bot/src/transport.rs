//! Messaging transport boundary.
//!
//! The bot core never talks to Telegram directly. Inbound updates are
//! converted to [`Inbound`] events, and everything outbound goes through the
//! [`Transport`] trait so handlers and the recorder can be tested against a
//! fake.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use watchpost_core::{PromptId, SubscriberId};

/// Errors that can occur when delivering a message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The messaging API rejected the request.
    #[error("api error: {0}")]
    Api(String),

    /// A local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text shown on the button.
    pub label: String,
    /// Payload returned in the reply event when pressed.
    pub data: String,
}

impl Button {
    /// Create a new button.
    #[must_use]
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons attached to a prompt.
pub type Keyboard = Vec<Vec<Button>>;

/// An inbound slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command name without the leading slash.
    pub name: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
    /// Who sent the command.
    pub requester: SubscriberId,
    /// Requester's display name.
    pub display_name: String,
}

/// An inbound button press on a previously sent prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    /// Prompt the button belongs to.
    pub prompt: PromptId,
    /// Button payload.
    pub payload: String,
    /// Who pressed the button.
    pub requester: SubscriberId,
    /// Requester's display name.
    pub display_name: String,
}

/// Transport-neutral inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Slash command.
    Command(CommandRequest),
    /// Button press.
    Reply(ReplyEvent),
}

/// Outbound side of the messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text.
    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<(), TransportError>;

    /// Send text with inline buttons, returning the id used to correlate replies.
    async fn send_prompt(
        &self,
        to: SubscriberId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<PromptId, TransportError>;

    /// Replace the text (and optionally the buttons) of a previously sent prompt.
    ///
    /// Passing `None` removes the buttons.
    async fn edit_prompt(
        &self,
        to: SubscriberId,
        prompt: PromptId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    /// Send a recorded video file.
    async fn send_video(&self, to: SubscriberId, path: &Path) -> Result<(), TransportError>;
}
