//! Open and subscriber commands: help, activate, leave, status.

use std::fmt::Write as _;

use tracing::info;
use watchpost_core::Role;

use super::{CommandKind, Response, role_of};
use crate::error::AppError;
use crate::state::AppState;
use crate::transport::CommandRequest;

/// `/start`, `/help`: commands the requester may run.
pub(super) async fn help(state: &AppState, request: &CommandRequest) -> Result<Response, AppError> {
    let mut text = String::from("Available commands:");
    for kind in CommandKind::ALL {
        if kind == CommandKind::Start {
            continue;
        }
        if state
            .registry()
            .is_authorized(request.requester, kind.required_role())
            .await
        {
            let _ = write!(text, "\n/{} {}", kind.name(), kind.description());
        }
    }
    Ok(Response::Text(text))
}

/// `/activate <token>`
pub(super) async fn activate(
    state: &AppState,
    request: &CommandRequest,
) -> Result<Response, AppError> {
    let value = request
        .args
        .first()
        .ok_or_else(|| AppError::BadRequest("Usage: /activate <token>".to_string()))?;

    let user = state
        .registry()
        .activate(value, request.requester, &request.display_name)
        .await?;

    let moderators: Vec<_> = state
        .registry()
        .users()
        .await
        .at_least(Role::Mod)
        .into_iter()
        .filter(|moderator| moderator.id != user.id)
        .collect();
    state
        .notifier()
        .broadcast(
            &moderators,
            &format!("{} subscribed as {}.", user.name, user.role),
        )
        .await;

    Ok(Response::Text(format!("Subscribed as {}!", user.role)))
}

/// `/leave`
pub(super) async fn leave(
    state: &AppState,
    request: &CommandRequest,
) -> Result<Response, AppError> {
    if role_of(state, request.requester).await == Role::Owner {
        return Err(AppError::BadRequest("The owner cannot leave.".to_string()));
    }

    if !state.registry().users_mut().await.remove(request.requester) {
        return Err(AppError::NotFound(format!("subscriber {}", request.requester)));
    }

    info!(subscriber = %request.requester, "Subscriber left");
    Ok(Response::text("You have unsubscribed."))
}

/// `/status`
pub(super) async fn status(state: &AppState) -> Result<Response, AppError> {
    let status = state.recorder().status().await;
    Ok(Response::Text(format!(
        "Surveillance: {}\nRecorder: {}\nMotion: {}",
        if status.paused { "paused" } else { "active" },
        status.phase,
        if status.motion_active {
            "detected"
        } else {
            "none"
        },
    )))
}
