//! Integration tests for token creation, direct and interactive.

use watchpost_core::{PromptId, Role, SubscriberId};
use watchpost_integration_tests::{OWNER, TestContext};

const ADMIN: SubscriberId = SubscriberId::new(20);
const MOD: SubscriberId = SubscriberId::new(21);
const NEWCOMER: SubscriberId = SubscriberId::new(22);

/// Pull the token value out of a "Newly created ... token: VALUE" message.
fn token_value(text: &str) -> String {
    text.lines()
        .next()
        .and_then(|line| line.rsplit(' ').next())
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Direct Creation
// =============================================================================

#[tokio::test]
async fn test_direct_token_creation() {
    let ctx = TestContext::with_owner().await;

    ctx.command(OWNER, "token", &["-m", "3"]).await;

    let text = ctx.last_text(OWNER).await.unwrap();
    assert!(text.starts_with("Newly created mod token: "));

    ctx.command(NEWCOMER, "activate", &[&token_value(&text)]).await;
    assert_eq!(ctx.role_of(NEWCOMER).await, Some(Role::Mod));
}

#[tokio::test]
async fn test_direct_token_validation() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(ADMIN, Role::Admin).await;

    ctx.command(ADMIN, "token", &["-x"]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("Please use one of the options: -a for admin, -m for mod, -s for subscriber.")
    );

    ctx.command(ADMIN, "token", &["-a"]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("You can only generate tokens for roles lower than your own.")
    );

    ctx.command(ADMIN, "token", &["-s", "soon"]).await;
    assert!(
        ctx.last_text(ADMIN)
            .await
            .unwrap()
            .starts_with("If you want to provide a period of validity")
    );

    assert!(ctx.state.registry().live_tokens().await.is_empty());
}

#[tokio::test]
async fn test_mods_cannot_create_tokens() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(MOD, Role::Mod).await;

    ctx.command(MOD, "token", &["-s"]).await;
    assert_eq!(ctx.last_text(MOD).await.as_deref(), Some("Unauthorized!"));
}

#[tokio::test]
async fn test_clear_tokens() {
    let ctx = TestContext::with_owner().await;
    ctx.command(OWNER, "token", &["-s"]).await;
    ctx.command(OWNER, "token", &["-m"]).await;

    ctx.command(OWNER, "cleartokens", &[]).await;

    // The owner bootstrap token was consumed during setup.
    assert_eq!(
        ctx.last_text(OWNER).await.as_deref(),
        Some("Revoked 2 token(s).")
    );
    assert!(ctx.state.registry().live_tokens().await.is_empty());
}

// =============================================================================
// Interactive Creation
// =============================================================================

#[tokio::test]
async fn test_interactive_token_flow() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(ADMIN, Role::Admin).await;

    ctx.command(ADMIN, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();
    assert_eq!(prompt.to, ADMIN);
    let offered: Vec<_> = prompt.keyboard[0].iter().map(|b| b.data.as_str()).collect();
    assert_eq!(offered, vec!["role:sub", "role:mod"]);

    ctx.press(ADMIN, prompt.prompt, "role:mod").await;
    let edit = ctx.transport.last_edit().await.unwrap();
    assert_eq!(edit.prompt, prompt.prompt);
    assert!(edit.text.starts_with("Role: mod"));
    assert!(edit.keyboard.is_some());

    ctx.press(ADMIN, prompt.prompt, "days:7").await;
    let edit = ctx.transport.last_edit().await.unwrap();
    assert!(edit.text.starts_with("Newly created mod token: "));
    assert!(edit.keyboard.is_none());
    assert!(ctx.state.interactions().is_empty().await);

    ctx.command(NEWCOMER, "activate", &[&token_value(&edit.text)])
        .await;
    assert_eq!(ctx.role_of(NEWCOMER).await, Some(Role::Mod));
}

#[tokio::test]
async fn test_interactive_rejects_own_role() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(ADMIN, Role::Admin).await;

    ctx.command(ADMIN, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();

    // A forged payload for a role that was never offered.
    ctx.press(ADMIN, prompt.prompt, "role:admin").await;

    let edit = ctx.transport.last_edit().await.unwrap();
    assert_eq!(
        edit.text,
        "You can only generate tokens for roles lower than your own."
    );
    assert!(ctx.state.registry().live_tokens().await.is_empty());
}

#[tokio::test]
async fn test_cancel_ends_flow() {
    let ctx = TestContext::with_owner().await;

    ctx.command(OWNER, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();
    ctx.press(OWNER, prompt.prompt, "cancel").await;

    assert_eq!(ctx.transport.last_edit().await.unwrap().text, "Cancelled.");
    assert!(ctx.state.interactions().is_empty().await);
}

#[tokio::test]
async fn test_unknown_prompt_reports_expiry() {
    let ctx = TestContext::with_owner().await;

    ctx.press(OWNER, PromptId::new(4242), "days:1").await;

    let edit = ctx.transport.last_edit().await.unwrap();
    assert_eq!(edit.prompt, PromptId::new(4242));
    assert_eq!(edit.text, "This selection has expired.");
}

#[tokio::test]
async fn test_completed_prompt_reports_expiry() {
    let ctx = TestContext::with_owner().await;

    ctx.command(OWNER, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();
    ctx.press(OWNER, prompt.prompt, "role:sub").await;
    ctx.press(OWNER, prompt.prompt, "days:1").await;

    // Pressing a stale button again.
    ctx.press(OWNER, prompt.prompt, "days:30").await;

    assert_eq!(
        ctx.transport.last_edit().await.unwrap().text,
        "This selection has expired."
    );
    assert_eq!(ctx.state.registry().live_tokens().await.len(), 1);
}

#[tokio::test]
async fn test_double_press_issues_one_token() {
    let ctx = TestContext::with_owner().await;

    ctx.command(OWNER, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();
    ctx.press(OWNER, prompt.prompt, "role:sub").await;

    tokio::join!(
        ctx.press(OWNER, prompt.prompt, "days:1"),
        ctx.press(OWNER, prompt.prompt, "days:7")
    );

    assert_eq!(ctx.state.registry().live_tokens().await.len(), 1);
    assert!(ctx.state.interactions().is_empty().await);
}

#[tokio::test]
async fn test_reply_from_someone_else_is_rejected() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(ADMIN, Role::Admin).await;

    ctx.command(OWNER, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();

    ctx.press(ADMIN, prompt.prompt, "role:sub").await;

    let edit = ctx.transport.last_edit().await.unwrap();
    assert_eq!(edit.to, ADMIN);
    assert_eq!(edit.text, "This selection has expired.");
    // The owner's flow is untouched.
    assert_eq!(ctx.state.interactions().len().await, 1);
}

#[tokio::test]
async fn test_reply_rechecks_role() {
    let ctx = TestContext::with_owner().await;
    ctx.subscribe(ADMIN, Role::Admin).await;

    ctx.command(ADMIN, "token", &[]).await;
    let prompt = ctx.transport.last_prompt().await.unwrap();

    // Banned between prompt and reply.
    ctx.state.registry().users_mut().await.ban(ADMIN);
    ctx.press(ADMIN, prompt.prompt, "role:sub").await;

    assert_eq!(ctx.transport.last_edit().await.unwrap().text, "Unauthorized!");
    assert!(ctx.state.interactions().is_empty().await);
}
