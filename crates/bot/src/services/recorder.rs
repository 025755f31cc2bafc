//! Async driver for the recording session.
//!
//! A start edge spawns one capture task. That task starts the camera, sends
//! the start alert, runs the drain timer, stops the camera and hands the
//! artifact to the delivery worker, restarting in place after a capped
//! capture. The session lock is never held across camera or transport I/O.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use watchpost_core::Role;

use super::notify::Notifier;
use super::session::{MotionAction, Phase, Session, StopReason, TickOutcome};
use crate::config::RecordingConfig;
use crate::error::AppError;
use crate::hardware::Camera;

/// Alert sent whenever a capture starts.
pub const START_ALERT: &str = "Motion detected, recording started!";

/// Snapshot of the session for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderStatus {
    /// Current phase.
    pub phase: Phase,
    /// Last reported motion level.
    pub motion_active: bool,
    /// Whether new captures are suppressed.
    pub paused: bool,
}

/// Drives the camera from motion edges.
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<RecorderInner>,
}

struct RecorderInner {
    camera: Arc<dyn Camera>,
    session: Mutex<Session>,
    notifier: Notifier,
    artifacts: mpsc::Sender<PathBuf>,
    config: RecordingConfig,
    alert_min_role: Role,
}

impl Recorder {
    /// Create a recorder sending finished recordings into `artifacts`.
    #[must_use]
    pub fn new(
        camera: Arc<dyn Camera>,
        notifier: Notifier,
        artifacts: mpsc::Sender<PathBuf>,
        config: RecordingConfig,
        alert_min_role: Role,
    ) -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                camera,
                session: Mutex::new(Session::new(&config)),
                notifier,
                artifacts,
                config,
                alert_min_role,
            }),
        }
    }

    /// Handle a motion edge from the sensor.
    ///
    /// Returns the capture task when this edge started one.
    #[instrument(skip(self))]
    pub async fn on_motion_edge(&self, active: bool) -> Option<JoinHandle<()>> {
        let action = self.inner.session.lock().await.on_motion(active);
        match action {
            MotionAction::StartCapture => {
                let recorder = self.clone();
                Some(tokio::spawn(async move { recorder.run_capture().await }))
            }
            MotionAction::Ignore => None,
        }
    }

    /// Pause or resume new captures.
    ///
    /// A capture in progress is not interrupted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyInState` if the flag already had that value.
    pub async fn set_paused(&self, paused: bool) -> Result<(), AppError> {
        if self.inner.session.lock().await.set_paused(paused) {
            info!(paused, "Surveillance pause toggled");
            Ok(())
        } else if paused {
            Err(AppError::AlreadyInState(
                "Surveillance is already paused.".to_string(),
            ))
        } else {
            Err(AppError::AlreadyInState(
                "Surveillance is already active.".to_string(),
            ))
        }
    }

    /// Current session state.
    pub async fn status(&self) -> RecorderStatus {
        let session = self.inner.session.lock().await;
        RecorderStatus {
            phase: session.phase(),
            motion_active: session.motion_active(),
            paused: session.paused(),
        }
    }

    /// Whether the camera reports a capture in progress.
    #[must_use]
    pub fn camera_recording(&self) -> bool {
        self.inner.camera.is_recording()
    }

    /// Feed edges from `edges` into the recorder until the channel closes.
    pub fn spawn_motion_listener(self, mut edges: mpsc::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(active) = edges.recv().await {
                self.on_motion_edge(active).await;
            }
            info!("Motion listener stopped");
        })
    }

    async fn run_capture(self) {
        loop {
            if let Err(e) = self.inner.camera.start().await {
                AppError::from(e).report("camera start");
                self.inner.session.lock().await.capture_failed();
                return;
            }
            self.inner.session.lock().await.capture_started();
            info!("Capture started");

            self.inner
                .notifier
                .alert(START_ALERT, self.inner.alert_min_role)
                .await;

            let Some(reason) = self.drain().await else {
                warn!("Drain timer ended without a running capture");
                return;
            };

            self.finish_capture(reason).await;

            if !self.inner.session.lock().await.capture_stopped(reason) {
                return;
            }
            info!("Restarting capture");
        }
    }

    /// Tick until the session says stop.
    async fn drain(&self) -> Option<StopReason> {
        loop {
            tokio::time::sleep(self.inner.config.tick_interval).await;
            match self.inner.session.lock().await.tick() {
                TickOutcome::Continue => {}
                TickOutcome::Stop(reason) => return Some(reason),
                TickOutcome::NotRecording => return None,
            }
        }
    }

    async fn finish_capture(&self, reason: StopReason) {
        match self.inner.camera.stop().await {
            Ok(path) => {
                info!(?reason, path = %path.display(), "Capture stopped");
                if let Err(e) = self.inner.artifacts.send(path).await {
                    error!(error = %e, "Delivery worker is gone, dropping recording");
                }
            }
            Err(e) => AppError::from(e).report("camera stop"),
        }
    }
}
