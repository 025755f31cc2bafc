//! Application state shared across handlers and background tasks.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tracing::info;

use crate::access::Registry;
use crate::config::{AccessConfig, RecordingConfig};
use crate::hardware::Camera;
use crate::services::{Interactions, Notifier, Recorder};
use crate::transport::Transport;

/// Capacity of the recording hand-off channel.
const ARTIFACT_QUEUE: usize = 16;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    access: AccessConfig,
    registry: Arc<Registry>,
    interactions: Interactions,
    notifier: Notifier,
    recorder: Recorder,
    transport: Arc<dyn Transport>,
}

impl AppState {
    /// Wire up the registry, notifier and recorder.
    ///
    /// Returns the state and the receiving end of the recording channel,
    /// which should be handed to [`Notifier::spawn_delivery_worker`].
    #[must_use]
    pub fn new(
        access: AccessConfig,
        recording: RecordingConfig,
        transport: Arc<dyn Transport>,
        camera: Arc<dyn Camera>,
    ) -> (Self, mpsc::Receiver<PathBuf>) {
        let registry = Arc::new(Registry::new(access.token_length));
        let notifier = Notifier::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            access.artifact_min_role,
        );
        let (artifacts_tx, artifacts_rx) = mpsc::channel(ARTIFACT_QUEUE);
        let recorder = Recorder::new(
            camera,
            notifier.clone(),
            artifacts_tx,
            recording,
            access.alert_min_role,
        );

        let state = Self {
            inner: Arc::new(AppStateInner {
                access,
                registry,
                interactions: Interactions::new(),
                notifier,
                recorder,
                transport,
            }),
        };
        (state, artifacts_rx)
    }

    /// Register the configured owner bootstrap token.
    ///
    /// Returns false if it was already registered.
    pub async fn bootstrap_owner(&self) -> bool {
        let minted = self
            .inner
            .registry
            .bootstrap_owner(self.inner.access.owner_token.expose_secret())
            .await
            .is_some();
        if minted {
            info!("Owner activation token registered, valid for one day");
        }
        minted
    }

    /// Access configuration.
    #[must_use]
    pub fn access(&self) -> &AccessConfig {
        &self.inner.access
    }

    /// Users and tokens.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Pending multi-step flows.
    #[must_use]
    pub fn interactions(&self) -> &Interactions {
        &self.inner.interactions
    }

    /// Notification dispatch.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Recording driver.
    #[must_use]
    pub fn recorder(&self) -> &Recorder {
        &self.inner.recorder
    }

    /// Outbound transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }
}
