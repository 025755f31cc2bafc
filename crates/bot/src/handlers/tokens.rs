//! `/token` and `/cleartokens`.
//!
//! `/token -s|-m|-a [days]` issues directly. Without arguments it starts an
//! interactive flow: pick a role, then pick a validity.

use watchpost_core::Role;

use super::{Response, role_of};
use crate::error::AppError;
use crate::models::Token;
use crate::services::interactions::{days_keyboard, role_keyboard};
use crate::services::{Choice, Flow, TOKEN_DAY_CHOICES, TokenStage};
use crate::state::AppState;
use crate::transport::{CommandRequest, ReplyEvent};

const OPTIONS_HINT: &str =
    "Please use one of the options: -a for admin, -m for mod, -s for subscriber.";
const LOWER_ROLES_ONLY: &str = "You can only generate tokens for roles lower than your own.";

/// Roles `issuer` may create tokens for: at least `Sub`, strictly below its own.
fn issuable_roles(issuer: Role) -> Vec<Role> {
    issuer.lower().filter(|role| *role >= Role::Sub).collect()
}

fn render_token(token: &Token) -> String {
    format!(
        "Newly created {} token: {}\nValid until {} UTC",
        token.role,
        token.value,
        token.expires_at.format("%Y-%m-%d %H:%M")
    )
}

/// Parse `-s|-m|-a [days]`.
fn parse_args(args: &[String], default_days: u32) -> Result<(Role, u32), AppError> {
    let role = args
        .first()
        .and_then(|flag| Role::from_flag(flag).ok())
        .ok_or_else(|| AppError::BadRequest(OPTIONS_HINT.to_string()))?;

    let days = match args.get(1) {
        Some(raw) => raw.parse::<u32>().ok().filter(|days| *days > 0).ok_or_else(|| {
            AppError::BadRequest(format!(
                "If you want to provide a period of validity, please use positive whole \
                 numbers only. Default is {default_days} day(s)."
            ))
        })?,
        None => default_days,
    };

    Ok((role, days))
}

/// `/token`
pub(super) async fn create(
    state: &AppState,
    request: &CommandRequest,
) -> Result<Response, AppError> {
    let issuer = role_of(state, request.requester).await;

    if request.args.is_empty() {
        let roles = issuable_roles(issuer);
        if roles.is_empty() {
            return Err(AppError::BadRequest(LOWER_ROLES_ONLY.to_string()));
        }
        return Ok(Response::Prompt {
            text: "Select the role for the new token:".to_string(),
            keyboard: role_keyboard(&roles),
            flow: Flow::Token(TokenStage::PickRole),
        });
    }

    let (role, days) = parse_args(&request.args, state.access().default_token_days)?;
    if role >= issuer {
        return Err(AppError::BadRequest(LOWER_ROLES_ONLY.to_string()));
    }

    let token = state.registry().issue_token(role, days).await?;
    Ok(Response::Text(render_token(&token)))
}

/// Replies in the interactive token flow.
pub(super) async fn reply(
    state: &AppState,
    event: &ReplyEvent,
    stage: TokenStage,
    choice: Choice,
) -> Result<Response, AppError> {
    let issuer = role_of(state, event.requester).await;

    match (stage, choice) {
        (TokenStage::PickRole, Choice::Role(role)) => {
            if !issuable_roles(issuer).contains(&role) {
                return Err(AppError::BadRequest(LOWER_ROLES_ONLY.to_string()));
            }
            state
                .interactions()
                .update(
                    event.prompt,
                    event.requester,
                    Flow::Token(TokenStage::PickDuration { role }),
                )
                .await;
            Ok(Response::Edit {
                text: format!("Role: {role}\nSelect how long the token stays valid:"),
                keyboard: Some(days_keyboard()),
            })
        }
        (TokenStage::PickDuration { role }, Choice::Days(days)) => {
            if !TOKEN_DAY_CHOICES.contains(&days) {
                return Err(AppError::BadRequest(format!("Unsupported validity: {days}")));
            }
            if role >= issuer {
                return Err(AppError::BadRequest(LOWER_ROLES_ONLY.to_string()));
            }

            let token = state.registry().issue_token(role, days).await?;
            Ok(Response::done(render_token(&token)))
        }
        (_, other) => Err(AppError::BadRequest(format!(
            "Unexpected selection: {other}"
        ))),
    }
}

/// `/cleartokens`
pub(super) async fn clear(state: &AppState) -> Result<Response, AppError> {
    let cleared = state.registry().clear_tokens().await;
    Ok(Response::Text(format!("Revoked {cleared} token(s).")))
}
