//! Camera driver backed by external commands.
//!
//! A capture runs the configured capture command (e.g. `libcamera-vid`)
//! writing a raw `.h264` stream. Stopping kills that process, converts the
//! stream to `.mp4` with the conversion command (e.g. `MP4Box`), and removes
//! the raw file.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{Camera, CameraError};
use crate::config::HardwareConfig;

const RAW_EXTENSION: &str = "h264";
const CONVERTED_EXTENSION: &str = "mp4";

struct ActiveCapture {
    child: Child,
    raw: PathBuf,
    output: PathBuf,
}

/// Camera that shells out to capture and conversion commands.
pub struct CommandCamera {
    video_dir: PathBuf,
    capture_cmd: String,
    convert_cmd: String,
    active: Mutex<Option<ActiveCapture>>,
    recording: AtomicBool,
}

impl std::fmt::Debug for CommandCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandCamera")
            .field("video_dir", &self.video_dir)
            .field("capture_cmd", &self.capture_cmd)
            .field("convert_cmd", &self.convert_cmd)
            .field("recording", &self.recording.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl CommandCamera {
    /// Create a camera from hardware configuration.
    #[must_use]
    pub fn new(config: &HardwareConfig) -> Self {
        Self {
            video_dir: config.video_dir.clone(),
            capture_cmd: config.capture_cmd.clone(),
            convert_cmd: config.convert_cmd.clone(),
            active: Mutex::new(None),
            recording: AtomicBool::new(false),
        }
    }

    /// Base name for the next recording.
    fn next_name() -> String {
        Utc::now().format("%Y-%m-%d-%H-%M-%S").to_string()
    }
}

#[async_trait]
impl Camera for CommandCamera {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), CameraError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(CameraError::AlreadyRecording);
        }

        tokio::fs::create_dir_all(&self.video_dir).await?;

        let name = Self::next_name();
        let raw = self.video_dir.join(format!("{name}.{RAW_EXTENSION}"));
        let output = self.video_dir.join(format!("{name}.{CONVERTED_EXTENSION}"));

        let child = build_command(&self.capture_cmd, &[("{output}", &raw)])?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        info!(raw = %raw.display(), "Started recording");
        *active = Some(ActiveCapture { child, raw, output });
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<PathBuf, CameraError> {
        let Some(mut capture) = self.active.lock().await.take() else {
            return Err(CameraError::NotRecording);
        };
        self.recording.store(false, Ordering::SeqCst);

        // The capture process may already have exited on its own.
        if let Err(e) = capture.child.start_kill() {
            debug!(error = %e, "Capture process already gone");
        }
        let status = capture.child.wait().await?;
        debug!(%status, "Capture process exited");

        let status = build_command(
            &self.convert_cmd,
            &[("{input}", &capture.raw), ("{output}", &capture.output)],
        )?
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

        if !status.success() {
            return Err(CameraError::ConversionFailed(status.to_string()));
        }

        if let Err(e) = tokio::fs::remove_file(&capture.raw).await {
            warn!(error = %e, raw = %capture.raw.display(), "Failed to remove raw recording");
        }

        info!(output = %capture.output.display(), "Stopped recording");
        Ok(capture.output)
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

/// Build a command from a whitespace-separated template.
///
/// Placeholders are substituted per argument after splitting, so paths
/// containing spaces stay a single argument.
fn build_command(template: &str, vars: &[(&str, &Path)]) -> Result<Command, CameraError> {
    let mut parts = template.split_whitespace().map(|part| {
        vars.iter().fold(part.to_string(), |acc, (key, path)| {
            acc.replace(key, &path.to_string_lossy())
        })
    });

    let program = parts
        .next()
        .ok_or_else(|| CameraError::InvalidCommand(template.to_string()))?;

    let mut command = Command::new(program);
    command.args(parts);
    Ok(command)
}
