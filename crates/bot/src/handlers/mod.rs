//! Command and reply entry points.
//!
//! Every inbound event goes through [`handle`]. Commands are parsed into a
//! [`CommandKind`], checked against the access gate, and routed to a handler
//! that returns a transport-neutral [`Response`]. Button presses are matched
//! to their pending flow, re-checked against the flow's role, and routed the
//! same way. Errors never escape: they are reported and rendered as text.

mod subscription;
mod surveillance;
mod tokens;
mod users;

use std::str::FromStr;

use tracing::{instrument, warn};
use watchpost_core::{Role, SubscriberId};

use crate::error::{AppError, clear_sentry_user, set_sentry_user, with_request_hub};
use crate::services::{Choice, Flow};
use crate::state::AppState;
use crate::transport::{CommandRequest, Inbound, Keyboard, ReplyEvent};

/// Bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `/start`
    Start,
    /// `/help`
    Help,
    /// `/activate <token>`
    Activate,
    /// `/leave`
    Leave,
    /// `/status`
    Status,
    /// `/users`
    Users,
    /// `/banned`
    Banned,
    /// `/ban`
    Ban,
    /// `/unban`
    Unban,
    /// `/token [-s|-m|-a] [days]`
    Token,
    /// `/cleartokens`
    ClearTokens,
    /// `/pause`
    Pause,
    /// `/unpause`
    Unpause,
    /// `/clear`
    Clear,
}

impl CommandKind {
    /// All commands in help order.
    pub const ALL: [Self; 14] = [
        Self::Start,
        Self::Help,
        Self::Activate,
        Self::Leave,
        Self::Status,
        Self::Users,
        Self::Banned,
        Self::Ban,
        Self::Unban,
        Self::Token,
        Self::ClearTokens,
        Self::Pause,
        Self::Unpause,
        Self::Clear,
    ];

    /// Command name without the slash.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Activate => "activate",
            Self::Leave => "leave",
            Self::Status => "status",
            Self::Users => "users",
            Self::Banned => "banned",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Token => "token",
            Self::ClearTokens => "cleartokens",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::Clear => "clear",
        }
    }

    /// Minimum role allowed to run the command.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Start | Self::Help | Self::Activate => Role::Open,
            Self::Leave | Self::Status => Role::Sub,
            Self::Users | Self::Banned | Self::Ban | Self::Unban => Role::Mod,
            Self::Token | Self::ClearTokens | Self::Pause | Self::Unpause => Role::Admin,
            Self::Clear => Role::Owner,
        }
    }

    /// One-line help text.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start | Self::Help => "show this help",
            Self::Activate => "<token> - subscribe with an activation token",
            Self::Leave => "unsubscribe",
            Self::Status => "show the surveillance state",
            Self::Users => "list subscribers",
            Self::Banned => "list banned subscribers",
            Self::Ban => "ban a subscriber",
            Self::Unban => "lift a ban",
            Self::Token => "[-s|-m|-a] [days] - create an activation token",
            Self::ClearTokens => "revoke all activation tokens",
            Self::Pause => "pause surveillance",
            Self::Unpause => "resume surveillance",
            Self::Clear => "remove every subscriber but the owner",
        }
    }
}

impl FromStr for CommandKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown command /{s}. Try /help.")))
    }
}

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Plain text to the requester.
    Text(String),
    /// A prompt with buttons that starts `flow`.
    Prompt {
        /// Prompt text.
        text: String,
        /// Choices.
        keyboard: Keyboard,
        /// Flow to register once the prompt is sent.
        flow: Flow,
    },
    /// Replace the prompt a reply came from.
    Edit {
        /// New text.
        text: String,
        /// New buttons, `None` to remove them.
        keyboard: Option<Keyboard>,
    },
}

impl Response {
    fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn done(text: impl Into<String>) -> Self {
        Self::Edit {
            text: text.into(),
            keyboard: None,
        }
    }
}

/// Handle one inbound event.
///
/// Each event gets its own Sentry hub, so concurrent handlers never see each
/// other's user.
pub async fn handle(state: &AppState, inbound: Inbound) {
    with_request_hub(async {
        match inbound {
            Inbound::Command(request) => handle_command(state, &request).await,
            Inbound::Reply(event) => handle_reply(state, &event).await,
        }
    })
    .await;
}

#[instrument(skip_all, fields(command = %request.name, requester = %request.requester))]
async fn handle_command(state: &AppState, request: &CommandRequest) {
    set_sentry_user(request.requester.as_i64(), &request.display_name);

    let response = match dispatch_command(state, request).await {
        Ok(response) => response,
        Err(e) => {
            e.report(&request.name);
            Response::Text(e.user_message())
        }
    };

    let to = request.requester;
    let sent = match response {
        Response::Text(text) | Response::Edit { text, .. } => {
            state.transport().send_text(to, &text).await
        }
        Response::Prompt {
            text,
            keyboard,
            flow,
        } => match state.transport().send_prompt(to, &text, &keyboard).await {
            Ok(prompt) => {
                state.interactions().begin(prompt, to, flow).await;
                Ok(())
            }
            Err(e) => Err(e),
        },
    };
    if let Err(e) = sent {
        warn!(error = %e, "Failed to send command response");
    }

    clear_sentry_user();
}

async fn dispatch_command(
    state: &AppState,
    request: &CommandRequest,
) -> Result<Response, AppError> {
    let kind: CommandKind = request.name.parse()?;
    state
        .registry()
        .authorize(request.requester, kind.required_role())
        .await?;

    match kind {
        CommandKind::Start | CommandKind::Help => subscription::help(state, request).await,
        CommandKind::Activate => subscription::activate(state, request).await,
        CommandKind::Leave => subscription::leave(state, request).await,
        CommandKind::Status => subscription::status(state).await,
        CommandKind::Users => users::list(state).await,
        CommandKind::Banned => users::list_banned(state).await,
        CommandKind::Ban => users::ban(state, request).await,
        CommandKind::Unban => users::unban(state, request).await,
        CommandKind::Clear => users::clear(state).await,
        CommandKind::Token => tokens::create(state, request).await,
        CommandKind::ClearTokens => tokens::clear(state).await,
        CommandKind::Pause => surveillance::set_paused(state, true).await,
        CommandKind::Unpause => surveillance::set_paused(state, false).await,
    }
}

#[instrument(skip_all, fields(prompt = %event.prompt, requester = %event.requester))]
async fn handle_reply(state: &AppState, event: &ReplyEvent) {
    set_sentry_user(event.requester.as_i64(), &event.display_name);

    let response = match dispatch_reply(state, event).await {
        Ok(response) => response,
        Err(e) => {
            e.report("reply");
            Response::done(e.user_message())
        }
    };

    let to = event.requester;
    let sent = match response {
        Response::Edit { text, keyboard } => {
            state
                .transport()
                .edit_prompt(to, event.prompt, &text, keyboard.as_ref())
                .await
        }
        Response::Text(text) => {
            state
                .transport()
                .edit_prompt(to, event.prompt, &text, None)
                .await
        }
        Response::Prompt {
            text,
            keyboard,
            flow,
        } => match state.transport().send_prompt(to, &text, &keyboard).await {
            Ok(prompt) => {
                state.interactions().begin(prompt, to, flow).await;
                Ok(())
            }
            Err(e) => Err(e),
        },
    };
    if let Err(e) = sent {
        warn!(error = %e, "Failed to send reply response");
    }

    clear_sentry_user();
}

/// Claims the pending flow first; whatever happens next, only a handler that
/// moves the flow on puts it back.
async fn dispatch_reply(state: &AppState, event: &ReplyEvent) -> Result<Response, AppError> {
    let pending = state
        .interactions()
        .advance(event.prompt, event.requester)
        .await?;
    state
        .registry()
        .authorize(event.requester, pending.flow.required_role())
        .await?;

    let choice: Choice = event.payload.parse()?;
    if choice == Choice::Cancel {
        return Ok(Response::done("Cancelled."));
    }

    match pending.flow {
        Flow::Token(stage) => tokens::reply(state, event, stage, choice).await,
        Flow::Ban => users::ban_reply(state, event, choice).await,
        Flow::Unban => users::unban_reply(state, event, choice).await,
    }
}

/// Role of an active user, or `Open` for strangers.
async fn role_of(state: &AppState, id: SubscriberId) -> Role {
    state
        .registry()
        .users()
        .await
        .get(id)
        .map_or(Role::Open, |user| user.role)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_roundtrip() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.name().parse::<CommandKind>().unwrap(), kind);
        }
        assert!(matches!(
            "sudo".parse::<CommandKind>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_command_roles() {
        assert_eq!(CommandKind::Activate.required_role(), Role::Open);
        assert_eq!(CommandKind::Leave.required_role(), Role::Sub);
        assert_eq!(CommandKind::Ban.required_role(), Role::Mod);
        assert_eq!(CommandKind::Token.required_role(), Role::Admin);
        assert_eq!(CommandKind::Clear.required_role(), Role::Owner);
    }
}
