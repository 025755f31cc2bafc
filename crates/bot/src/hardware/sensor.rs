//! Motion sensor polling a sysfs GPIO value file.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::HardwareConfig;

/// Errors reading the sensor.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The value file could not be read.
    #[error("failed to read sensor: {0}")]
    Io(#[from] std::io::Error),

    /// The value file held something other than `0` or `1`.
    #[error("unexpected sensor level: {0:?}")]
    InvalidLevel(String),
}

/// Parse the contents of a GPIO value file.
///
/// # Errors
///
/// Returns `SensorError::InvalidLevel` for anything but `0` or `1`.
pub fn parse_level(raw: &str) -> Result<bool, SensorError> {
    match raw.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(SensorError::InvalidLevel(other.to_string())),
    }
}

/// Motion sensor wired to a GPIO pin exported through sysfs.
#[derive(Debug, Clone)]
pub struct SysfsSensor {
    path: PathBuf,
    poll: Duration,
}

impl SysfsSensor {
    /// Create a sensor from hardware configuration.
    #[must_use]
    pub fn new(config: &HardwareConfig) -> Self {
        Self {
            path: config.sensor_path.clone(),
            poll: config.sensor_poll,
        }
    }

    async fn read(&self) -> Result<bool, SensorError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        parse_level(&raw)
    }

    /// Poll the value file and send an edge whenever the level changes.
    ///
    /// The level is assumed low at startup, so a sensor that is already high
    /// produces a start edge on the first poll. The task ends when the
    /// receiver is dropped.
    pub fn spawn(self, edges: mpsc::Sender<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(path = %self.path.display(), "Motion sensor started");
            let mut interval = tokio::time::interval(self.poll);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut level = false;
            let mut failing = false;

            loop {
                interval.tick().await;

                match self.read().await {
                    Ok(current) => {
                        if failing {
                            info!("Motion sensor readable again");
                            failing = false;
                        }
                        if current != level {
                            level = current;
                            debug!(active = level, "Motion edge");
                            if edges.send(level).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        // Only log the first failure of a streak.
                        if !failing {
                            warn!(error = %e, "Failed to read motion sensor");
                            failing = true;
                        }
                    }
                }
            }

            info!("Motion sensor stopped");
        })
    }
}
