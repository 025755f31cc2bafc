//! Bot API types.
//!
//! A subset of the Telegram Bot API objects needed for commands, inline
//! keyboards and callback queries.
//!
//! See: <https://core.telegram.org/bots/api>

use serde::{Deserialize, Serialize};

use crate::transport::{Button, Keyboard};

/// Envelope around every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Result on success.
    pub result: Option<T>,
    /// Error description on failure.
    pub description: Option<String>,
    /// Error code on failure.
    pub error_code: Option<i32>,
}

/// An incoming update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id used as the polling offset.
    pub update_id: i64,
    /// New message.
    pub message: Option<Message>,
    /// Inline button press.
    pub callback_query: Option<CallbackQuery>,
}

/// A message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat.
    pub message_id: i64,
    /// Sender.
    pub from: Option<TgUser>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text content.
    pub text: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
    /// Chat type (`private`, `group`, ...).
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// A Telegram user.
#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    /// User id.
    pub id: i64,
    /// Whether this is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// First name.
    pub first_name: String,
    /// Username without `@`.
    pub username: Option<String>,
}

impl TgUser {
    /// Username if set, first name otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

/// An inline button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Query id, answered with `answerCallbackQuery`.
    pub id: String,
    /// Who pressed the button.
    pub from: TgUser,
    /// The message carrying the button.
    pub message: Option<Message>,
    /// Button payload.
    pub data: Option<String>,
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    /// Rows of buttons.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// A single inline button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    /// Label.
    pub text: String,
    /// Payload sent back in the callback query.
    pub callback_data: String,
}

impl From<&Button> for InlineKeyboardButton {
    fn from(button: &Button) -> Self {
        Self {
            text: button.label.clone(),
            callback_data: button.data.clone(),
        }
    }
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .iter()
                .map(|row| row.iter().map(InlineKeyboardButton::from).collect())
                .collect(),
        }
    }
}

/// `sendMessage` body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    /// Target chat.
    pub chat_id: i64,
    /// Text.
    pub text: &'a str,
    /// Optional buttons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// `editMessageText` body.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText<'a> {
    /// Target chat.
    pub chat_id: i64,
    /// Message to edit.
    pub message_id: i64,
    /// New text.
    pub text: &'a str,
    /// New buttons; omitted to remove them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// `getUpdates` body.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdates {
    /// First update id to return.
    pub offset: i64,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    /// Update kinds to receive.
    pub allowed_updates: Vec<&'static str>,
}

/// `answerCallbackQuery` body.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    /// Query to answer.
    pub callback_query_id: &'a str,
}
