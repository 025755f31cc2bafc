//! Directory commands: list, ban, unban, clear.

use tracing::info;
use watchpost_core::{Role, SubscriberId};

use super::{Response, role_of};
use crate::error::AppError;
use crate::models::User;
use crate::services::Choice;
use crate::services::interactions::{Flow, user_keyboard};
use crate::state::AppState;
use crate::transport::{CommandRequest, ReplyEvent};

/// Message sent to everyone removed by `/clear`.
const TERMINATED: &str = "Your subscription was terminated.";

fn render_list(title: &str, empty: &str, users: &[User]) -> String {
    if users.is_empty() {
        return empty.to_string();
    }
    users.iter().fold(title.to_string(), |mut text, user| {
        text.push('\n');
        text.push_str(&user.to_string());
        text
    })
}

fn selected(choice: Choice) -> Result<SubscriberId, AppError> {
    match choice {
        Choice::Subscriber(id) => Ok(id),
        other => Err(AppError::BadRequest(format!("Unexpected selection: {other}"))),
    }
}

/// `/users`
pub(super) async fn list(state: &AppState) -> Result<Response, AppError> {
    let users = state.registry().users().await.at_least(Role::MIN);
    Ok(Response::Text(render_list(
        "Subscribers:",
        "No subscribers.",
        &users,
    )))
}

/// `/banned`
pub(super) async fn list_banned(state: &AppState) -> Result<Response, AppError> {
    let banned = state.registry().users().await.banned();
    Ok(Response::Text(render_list(
        "Banned:",
        "No banned subscribers.",
        &banned,
    )))
}

/// `/ban`: offer active users of a strictly lower role.
pub(super) async fn ban(state: &AppState, request: &CommandRequest) -> Result<Response, AppError> {
    let role = role_of(state, request.requester).await;
    let candidates = state.registry().users().await.below(role);
    if candidates.is_empty() {
        return Ok(Response::text("There is nobody you can ban."));
    }

    Ok(Response::Prompt {
        text: "Select a subscriber to ban:".to_string(),
        keyboard: user_keyboard(&candidates),
        flow: Flow::Ban,
    })
}

pub(super) async fn ban_reply(
    state: &AppState,
    event: &ReplyEvent,
    choice: Choice,
) -> Result<Response, AppError> {
    let target = selected(choice)?;
    let role = role_of(state, event.requester).await;

    let name = {
        let mut users = state.registry().users_mut().await;
        let user = users
            .get(target)
            .filter(|user| user.role < role)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("subscriber {target}")))?;
        users.ban(target);
        user.name
    };

    info!(banned = %target, by = %event.requester, "Subscriber banned");
    Ok(Response::done(format!("{name} has been banned.")))
}

/// `/unban`: offer banned users of a strictly lower role.
pub(super) async fn unban(
    state: &AppState,
    request: &CommandRequest,
) -> Result<Response, AppError> {
    let role = role_of(state, request.requester).await;
    let candidates: Vec<_> = state
        .registry()
        .users()
        .await
        .banned()
        .into_iter()
        .filter(|user| user.role < role)
        .collect();
    if candidates.is_empty() {
        return Ok(Response::text("There is nobody you can unban."));
    }

    Ok(Response::Prompt {
        text: "Select a subscriber to unban:".to_string(),
        keyboard: user_keyboard(&candidates),
        flow: Flow::Unban,
    })
}

pub(super) async fn unban_reply(
    state: &AppState,
    event: &ReplyEvent,
    choice: Choice,
) -> Result<Response, AppError> {
    let target = selected(choice)?;
    let role = role_of(state, event.requester).await;

    let name = {
        let mut users = state.registry().users_mut().await;
        let user = users
            .banned()
            .into_iter()
            .find(|user| user.id == target && user.role < role)
            .ok_or_else(|| AppError::NotFound(format!("banned subscriber {target}")))?;
        users.unban(target);
        user.name
    };

    info!(unbanned = %target, by = %event.requester, "Subscriber unbanned");
    Ok(Response::done(format!("{name} has been unbanned.")))
}

/// `/clear`: drop everyone but the owner and tell them.
pub(super) async fn clear(state: &AppState) -> Result<Response, AppError> {
    let removed = state.registry().users_mut().await.reset_keep_owner();
    let report = state.notifier().broadcast(&removed, TERMINATED).await;

    info!(
        removed = removed.len(),
        notified = report.delivered,
        "Directory cleared"
    );
    Ok(Response::Text(format!(
        "Removed {} subscriber(s).",
        removed.len()
    )))
}
