//! Long-polling loop and update conversion.

use std::time::Duration;

use tracing::{debug, info, warn};
use watchpost_core::{PromptId, SubscriberId};

use super::client::TelegramClient;
use super::types::{CallbackQuery, Message, Update};
use crate::handlers;
use crate::state::AppState;
use crate::transport::{CommandRequest, Inbound, ReplyEvent};

/// Wait after a failed poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Convert a text message into a command, if it is one.
///
/// `/token@my_bot -s 3` becomes `token` with args `["-s", "3"]`.
#[must_use]
pub fn command_from_message(message: &Message) -> Option<CommandRequest> {
    let text = message.text.as_deref()?.trim();
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    Some(CommandRequest {
        name,
        args: parts.map(str::to_string).collect(),
        requester: SubscriberId::new(message.chat.id),
        display_name: message
            .from
            .as_ref()
            .map_or_else(|| message.chat.id.to_string(), |u| u.display_name().to_string()),
    })
}

/// Convert a button press into a reply event.
#[must_use]
pub fn reply_from_callback(query: &CallbackQuery) -> Option<ReplyEvent> {
    let message = query.message.as_ref()?;
    Some(ReplyEvent {
        prompt: PromptId::new(message.message_id),
        payload: query.data.clone()?,
        requester: SubscriberId::new(message.chat.id),
        display_name: query.from.display_name().to_string(),
    })
}

/// Convert an update into an inbound event.
#[must_use]
pub fn inbound_from_update(update: &Update) -> Option<Inbound> {
    if let Some(message) = &update.message {
        return command_from_message(message).map(Inbound::Command);
    }
    update
        .callback_query
        .as_ref()
        .and_then(reply_from_callback)
        .map(Inbound::Reply)
}

/// Poll for updates forever, handling each on its own task.
pub async fn run_polling(client: TelegramClient, state: AppState) {
    info!("Telegram polling started");
    let mut offset = 0;

    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "Polling failed, backing off");
                tokio::time::sleep(POLL_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(query) = &update.callback_query
                && let Err(e) = client.answer_callback_query(&query.id).await
            {
                debug!(error = %e, "Failed to answer callback query");
            }

            let Some(inbound) = inbound_from_update(&update) else {
                debug!(update_id = update.update_id, "Ignoring update");
                continue;
            };

            let state = state.clone();
            tokio::spawn(async move {
                handlers::handle(&state, inbound).await;
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::telegram::types::{Chat, TgUser};

    fn message(text: &str) -> Message {
        Message {
            message_id: 5,
            from: Some(TgUser {
                id: 7,
                is_bot: false,
                first_name: "Ada".to_string(),
                username: None,
            }),
            chat: Chat {
                id: 7,
                chat_type: "private".to_string(),
            },
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_command_parsing() {
        let command = command_from_message(&message("/Token@watch_bot -s 3")).unwrap();
        assert_eq!(command.name, "token");
        assert_eq!(command.args, vec!["-s", "3"]);
        assert_eq!(command.requester, SubscriberId::new(7));
        assert_eq!(command.display_name, "Ada");
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(command_from_message(&message("hello")).is_none());
        assert!(command_from_message(&message("/")).is_none());
    }

    #[test]
    fn test_callback_conversion() {
        let query = CallbackQuery {
            id: "q".to_string(),
            from: TgUser {
                id: 7,
                is_bot: false,
                first_name: "Ada".to_string(),
                username: Some("ada".to_string()),
            },
            message: Some(message("Select the role for the new token:")),
            data: Some("role:mod".to_string()),
        };

        let reply = reply_from_callback(&query).unwrap();
        assert_eq!(reply.prompt, PromptId::new(5));
        assert_eq!(reply.payload, "role:mod");
        assert_eq!(reply.display_name, "ada");
    }
}
