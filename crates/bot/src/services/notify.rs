//! Notification dispatch.
//!
//! Fan-out is best-effort: every recipient gets its own send, and a failure
//! for one is logged and counted without affecting the rest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use watchpost_core::Role;

use crate::access::Registry;
use crate::models::User;
use crate::transport::{Transport, TransportError};

/// Outcome of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients the message reached.
    pub delivered: usize,
    /// Recipients whose delivery failed.
    pub failed: usize,
}

impl DeliveryReport {
    fn tally<'a>(results: impl IntoIterator<Item = (&'a User, Result<(), TransportError>)>) -> Self {
        let mut report = Self::default();
        for (user, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(subscriber = %user.id, error = %e, "Delivery failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// Sends text and recordings to role-filtered views of the directory.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    artifact_min_role: Role,
}

impl Notifier {
    /// Create a notifier.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn Transport>,
        artifact_min_role: Role,
    ) -> Self {
        Self {
            registry,
            transport,
            artifact_min_role,
        }
    }

    /// Send `text` to every recipient concurrently.
    #[instrument(skip(self, recipients, text), fields(recipients = recipients.len()))]
    pub async fn broadcast(&self, recipients: &[User], text: &str) -> DeliveryReport {
        let results = join_all(
            recipients
                .iter()
                .map(|user| self.transport.send_text(user.id, text)),
        )
        .await;

        DeliveryReport::tally(recipients.iter().zip(results))
    }

    /// Send `text` to every active user with at least `min_role`.
    pub async fn alert(&self, text: &str, min_role: Role) -> DeliveryReport {
        let recipients = self.registry.users().await.at_least(min_role);
        self.broadcast(&recipients, text).await
    }

    /// Send a recording to every active user with at least the artifact role.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn deliver_artifact(&self, path: &Path) -> DeliveryReport {
        let recipients = self.registry.users().await.at_least(self.artifact_min_role);
        let results = join_all(
            recipients
                .iter()
                .map(|user| self.transport.send_video(user.id, path)),
        )
        .await;

        let report = DeliveryReport::tally(recipients.iter().zip(results));
        info!(
            delivered = report.delivered,
            failed = report.failed,
            "Recording delivered"
        );
        report
    }

    /// Deliver recordings from `artifacts` until the channel closes.
    ///
    /// File transfers run here so they never hold up sensor edges or
    /// commands.
    pub fn spawn_delivery_worker(self, mut artifacts: mpsc::Receiver<PathBuf>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(path) = artifacts.recv().await {
                self.deliver_artifact(&path).await;
            }
            info!("Delivery worker stopped");
        })
    }
}
