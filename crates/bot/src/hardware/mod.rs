//! Hardware collaborators: camera and motion sensor.
//!
//! - [`Camera`] is the driver boundary used by the recorder
//! - [`CommandCamera`] records by running external capture/convert commands
//! - [`SysfsSensor`] polls a GPIO value file and emits motion edges

mod camera;
mod sensor;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use camera::CommandCamera;
pub use sensor::{SensorError, SysfsSensor, parse_level};

/// Errors that can occur in the camera driver.
#[derive(Debug, Error)]
pub enum CameraError {
    /// `start` was called while a capture is running.
    #[error("camera is already recording")]
    AlreadyRecording,

    /// `stop` was called without a running capture.
    #[error("camera is not recording")]
    NotRecording,

    /// A command template is empty or unusable.
    #[error("invalid command template: {0}")]
    InvalidCommand(String),

    /// The conversion step exited unsuccessfully.
    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    /// Spawning or waiting on a process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera driver boundary.
///
/// The recorder never touches raw camera configuration; it only starts and
/// stops captures and receives the path of the finished artifact.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Begin a capture.
    async fn start(&self) -> Result<(), CameraError>;

    /// End the running capture and return the converted artifact.
    async fn stop(&self) -> Result<PathBuf, CameraError>;

    /// Whether a capture is running.
    fn is_recording(&self) -> bool;
}
