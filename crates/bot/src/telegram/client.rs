//! Telegram Bot API client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use watchpost_core::{PromptId, SubscriberId};

use super::error::TelegramError;
use super::types::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, InlineKeyboardMarkup, Message,
    SendMessage, Update,
};
use crate::config::TelegramConfig;
use crate::transport::{Keyboard, Transport, TransportError};

/// Long-poll timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// HTTP timeout; must exceed the long-poll timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(POLL_TIMEOUT_SECS + 30);

/// Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{api_base}/bot{token}`; contains the token.
    base_url: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError::Request` if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_base,
                config.bot_token.expose_secret()
            ),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(method)).json(body).send().await?;
        unwrap_response(response.json::<ApiResponse<T>>().await?)
    }

    /// Fetch updates after `offset`, waiting up to the long-poll timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: POLL_TIMEOUT_SECS,
                allowed_updates: vec!["message", "callback_query"],
            },
        )
        .await
    }

    /// Acknowledge a button press so the client stops its spinner.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    pub async fn answer_callback_query(&self, id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: id,
                },
            )
            .await?;
        Ok(())
    }

    /// Send a message, optionally with buttons.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self, text, keyboard), fields(chat = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<Message, TelegramError> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    reply_markup: keyboard.map(InlineKeyboardMarkup::from),
                },
            )
            .await?;
        debug!(message_id = message.message_id, "Message sent");
        Ok(message)
    }

    /// Replace the text and buttons of a message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it.
    #[instrument(skip(self, text, keyboard), fields(chat = %chat_id))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TelegramError> {
        // The result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id,
                    message_id,
                    text,
                    reply_markup: keyboard.map(InlineKeyboardMarkup::from),
                },
            )
            .await?;
        Ok(())
    }

    /// Upload a video file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, the request fails, or the API
    /// rejects it.
    #[instrument(skip(self), fields(chat = %chat_id, path = %path.display()))]
    pub async fn send_video(&self, chat_id: i64, path: &Path) -> Result<(), TelegramError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "video.mp4".to_string(), |n| n.to_string_lossy().into_owned());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("supports_streaming", "true")
            .part("video", part);

        let response = self
            .client
            .post(self.url("sendVideo"))
            .multipart(form)
            .send()
            .await?;
        let _: Message = unwrap_response(response.json::<ApiResponse<Message>>().await?)?;

        debug!("Video sent");
        Ok(())
    }
}

fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TelegramError> {
    if !response.ok {
        return Err(TelegramError::Api(format!(
            "{} ({})",
            response
                .description
                .unwrap_or_else(|| "Unknown error".to_string()),
            response.error_code.unwrap_or_default()
        )));
    }
    response
        .result
        .ok_or_else(|| TelegramError::Response("missing result".to_string()))
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<(), TransportError> {
        self.send_message(to.as_i64(), text, None).await?;
        Ok(())
    }

    async fn send_prompt(
        &self,
        to: SubscriberId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<PromptId, TransportError> {
        let message = self.send_message(to.as_i64(), text, Some(keyboard)).await?;
        Ok(PromptId::new(message.message_id))
    }

    async fn edit_prompt(
        &self,
        to: SubscriberId,
        prompt: PromptId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        self.edit_message_text(to.as_i64(), prompt.as_i64(), text, keyboard)
            .await?;
        Ok(())
    }

    async fn send_video(&self, to: SubscriberId, path: &Path) -> Result<(), TransportError> {
        Self::send_video(self, to.as_i64(), path).await?;
        Ok(())
    }
}
