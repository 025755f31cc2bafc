//! Configuration check.
//!
//! Loads the same environment (including `.env`) the bot reads at startup and
//! reports the effective settings with secrets redacted.

use watchpost_bot::config::{BotConfig, ConfigError};

/// Load and summarize bot configuration.
///
/// # Errors
///
/// Returns the first `ConfigError` the bot would fail with.
pub fn check() -> Result<(), ConfigError> {
    let config = BotConfig::from_env()?;

    tracing::info!("Configuration OK");
    tracing::info!("  Telegram: {:?}", config.telegram);
    tracing::info!("  Access: {:?}", config.access);
    tracing::info!(
        "  Recording: debounce {} ticks, cap {} ticks, tick {:?}, start paused: {}",
        config.recording.debounce_ticks,
        config.recording.max_capture_ticks,
        config.recording.tick_interval,
        config.recording.start_paused
    );
    tracing::info!("  Video dir: {}", config.hardware.video_dir.display());
    tracing::info!("  Capture: {}", config.hardware.capture_cmd);
    tracing::info!("  Convert: {}", config.hardware.convert_cmd);
    tracing::info!(
        "  Sensor: {} every {:?}",
        config.hardware.sensor_path.display(),
        config.hardware.sensor_poll
    );
    tracing::info!(
        "  Sentry: {}",
        if config.sentry_dsn.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}
