//! Integration tests for Watchpost.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p watchpost-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `access_flow` - activation, owner bootstrap, help, leave
//! - `token_flow` - direct and interactive token creation
//! - `moderation` - ban, unban, clear
//! - `recording` - motion to recording to delivery, with a paused clock
//! - `notifications` - fan-out with unreachable recipients
//!
//! Everything runs against [`FakeTransport`] and [`FakeCamera`]; no network
//! or hardware is touched.

use std::sync::Arc;

use secrecy::SecretString;
use watchpost_bot::config::{AccessConfig, RecordingConfig};
use watchpost_bot::handlers;
use watchpost_bot::state::AppState;
use watchpost_bot::transport::{CommandRequest, Inbound, ReplyEvent};
use watchpost_core::{PromptId, Role, SubscriberId};

pub use watchpost_bot::testing::{FakeCamera, FakeTransport, PromptEdit, SentPrompt};

/// Owner bootstrap token used by every context.
pub const OWNER_TOKEN: &str = "OWNERKEY42";

/// Chat id of the owner in [`TestContext::with_owner`].
pub const OWNER: SubscriberId = SubscriberId::new(1);

/// A bot wired to fakes.
pub struct TestContext {
    /// Shared application state.
    pub state: AppState,
    /// Records everything the bot sends.
    pub transport: Arc<FakeTransport>,
    /// Produces numbered artifacts.
    pub camera: Arc<FakeCamera>,
}

impl TestContext {
    /// A bot with default recording settings and a running delivery worker.
    pub async fn new() -> Self {
        Self::with_recording(RecordingConfig::default()).await
    }

    /// A bot with custom recording settings and a running delivery worker.
    pub async fn with_recording(recording: RecordingConfig) -> Self {
        let transport = Arc::new(FakeTransport::new());
        let camera = Arc::new(FakeCamera::new());
        let access = AccessConfig::new(SecretString::from(OWNER_TOKEN.to_string()));

        let (state, artifacts) = AppState::new(access, recording, transport.clone(), camera.clone());
        state.bootstrap_owner().await;
        state.notifier().clone().spawn_delivery_worker(artifacts);

        Self {
            state,
            transport,
            camera,
        }
    }

    /// A bot whose owner ([`OWNER`]) has already activated.
    pub async fn with_owner() -> Self {
        let ctx = Self::new().await;
        ctx.command(OWNER, "activate", &[OWNER_TOKEN]).await;
        ctx.transport.clear().await;
        ctx
    }

    /// Send a command as `from`.
    pub async fn command(&self, from: SubscriberId, name: &str, args: &[&str]) {
        let inbound = Inbound::Command(CommandRequest {
            name: name.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            requester: from,
            display_name: display_name(from),
        });
        handlers::handle(&self.state, inbound).await;
    }

    /// Press a button on `prompt` as `from`.
    pub async fn press(&self, from: SubscriberId, prompt: PromptId, payload: &str) {
        let inbound = Inbound::Reply(ReplyEvent {
            prompt,
            payload: payload.to_string(),
            requester: from,
            display_name: display_name(from),
        });
        handlers::handle(&self.state, inbound).await;
    }

    /// Register `id` with `role` by issuing and redeeming a token.
    pub async fn subscribe(&self, id: SubscriberId, role: Role) {
        let token = self
            .state
            .registry()
            .issue_token(role, 1)
            .await
            .unwrap_or_else(|e| panic!("failed to issue token: {e}"));
        self.command(id, "activate", &[&token.value]).await;
    }

    /// Last text sent to `id`.
    pub async fn last_text(&self, id: SubscriberId) -> Option<String> {
        self.transport.last_text_to(id).await
    }

    /// Role of `id` in the directory, if active.
    pub async fn role_of(&self, id: SubscriberId) -> Option<Role> {
        self.state.registry().users().await.get(id).map(|u| u.role)
    }
}

/// Display name used for `id` in commands.
#[must_use]
pub fn display_name(id: SubscriberId) -> String {
    format!("user{id}")
}
