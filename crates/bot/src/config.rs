//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WATCHPOST_TELEGRAM_TOKEN` - Telegram Bot API token
//! - `WATCHPOST_OWNER_TOKEN` - Fixed activation token for bootstrapping the owner
//!
//! ## Optional (access)
//! - `WATCHPOST_TOKEN_LENGTH` - Length of generated activation tokens (default: 8)
//! - `WATCHPOST_TOKEN_DAYS` - Default token validity in days (default: 1)
//! - `WATCHPOST_ALERT_ROLE` - Minimum role receiving motion alerts (default: open)
//! - `WATCHPOST_ARTIFACT_ROLE` - Minimum role receiving recordings (default: admin)
//!
//! ## Optional (recording)
//! - `WATCHPOST_DEBOUNCE_TICKS` - Inactive ticks before a capture stops (default: 2)
//! - `WATCHPOST_MAX_CAPTURE_TICKS` - Hard cap on ticks per capture (default: 30)
//! - `WATCHPOST_TICK_MS` - Drain timer interval in milliseconds (default: 1000)
//! - `WATCHPOST_START_PAUSED` - Start with surveillance paused (default: false)
//!
//! ## Optional (hardware)
//! - `WATCHPOST_VIDEO_DIR` - Directory for recordings (default: videos)
//! - `WATCHPOST_CAPTURE_CMD` - Capture command, `{output}` is substituted
//! - `WATCHPOST_CONVERT_CMD` - Conversion command, `{input}`/`{output}` are substituted
//! - `WATCHPOST_SENSOR_PATH` - GPIO value file of the motion sensor
//! - `WATCHPOST_SENSOR_POLL_MS` - Sensor poll interval in milliseconds (default: 100)
//!
//! ## Optional (Telegram / error tracking)
//! - `WATCHPOST_TELEGRAM_API` - Bot API base URL (default: <https://api.telegram.org>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use watchpost_core::Role;

const MIN_OWNER_TOKEN_LENGTH: usize = 8;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 2.5;
const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
const DEFAULT_CAPTURE_CMD: &str = "libcamera-vid -t 0 --width 1280 --height 720 -o {output}";
const DEFAULT_CONVERT_CMD: &str = "MP4Box -add {input} {output}";
const DEFAULT_SENSOR_PATH: &str = "/sys/class/gpio/gpio4/value";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "<",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Complete bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,
    /// Token and notification settings
    pub access: AccessConfig,
    /// Recording state machine settings
    pub recording: RecordingConfig,
    /// Camera and sensor settings
    pub hardware: HardwareConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`
    pub bot_token: SecretString,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Token issuance and notification settings.
///
/// Implements `Debug` manually to redact the owner token.
#[derive(Clone)]
pub struct AccessConfig {
    /// Fixed owner activation token, minted once at startup
    pub owner_token: SecretString,
    /// Length of generated token values
    pub token_length: usize,
    /// Default validity of issued tokens in days
    pub default_token_days: u32,
    /// Minimum role receiving motion alerts
    pub alert_min_role: Role,
    /// Minimum role receiving recordings
    pub artifact_min_role: Role,
}

impl std::fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessConfig")
            .field("owner_token", &"[REDACTED]")
            .field("token_length", &self.token_length)
            .field("default_token_days", &self.default_token_days)
            .field("alert_min_role", &self.alert_min_role)
            .field("artifact_min_role", &self.artifact_min_role)
            .finish()
    }
}

impl AccessConfig {
    /// Access settings with defaults for everything but the owner token.
    #[must_use]
    pub const fn new(owner_token: SecretString) -> Self {
        Self {
            owner_token,
            token_length: 8,
            default_token_days: 1,
            alert_min_role: Role::Open,
            artifact_min_role: Role::Admin,
        }
    }
}

/// Recording state machine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingConfig {
    /// Consecutive inactive ticks before a capture is considered finished.
    ///
    /// The sensor holds its output for about two seconds after the last
    /// movement, so two ticks give roughly four seconds of tail.
    pub debounce_ticks: u32,
    /// Ticks after which a capture is force-stopped
    pub max_capture_ticks: u32,
    /// Drain timer interval
    pub tick_interval: Duration,
    /// Whether surveillance starts paused
    pub start_paused: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            debounce_ticks: 2,
            max_capture_ticks: 30,
            tick_interval: Duration::from_secs(1),
            start_paused: false,
        }
    }
}

/// Camera and motion sensor settings.
#[derive(Debug, Clone)]
pub struct HardwareConfig {
    /// Directory recordings are written to
    pub video_dir: PathBuf,
    /// Capture command template
    pub capture_cmd: String,
    /// Conversion command template
    pub convert_cmd: String,
    /// GPIO value file of the motion sensor
    pub sensor_path: PathBuf,
    /// Sensor poll interval
    pub sensor_poll: Duration,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("videos"),
            capture_cmd: DEFAULT_CAPTURE_CMD.to_string(),
            convert_cmd: DEFAULT_CONVERT_CMD.to_string(),
            sensor_path: PathBuf::from(DEFAULT_SENSOR_PATH),
            sensor_poll: Duration::from_millis(100),
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let telegram = TelegramConfig::from_env()?;
        let access = AccessConfig::from_env()?;
        let recording = RecordingConfig::from_env()?;
        let hardware = HardwareConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            telegram,
            access,
            recording,
            hardware,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: get_validated_secret("WATCHPOST_TELEGRAM_TOKEN")?,
            api_base: get_env_or_default("WATCHPOST_TELEGRAM_API", DEFAULT_TELEGRAM_API)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl AccessConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let owner_token = get_validated_secret("WATCHPOST_OWNER_TOKEN")?;
        validate_owner_token(&owner_token, "WATCHPOST_OWNER_TOKEN")?;

        let token_length = parse_env_or("WATCHPOST_TOKEN_LENGTH", 8_usize)?;
        if token_length < 4 {
            return Err(ConfigError::InvalidEnvVar(
                "WATCHPOST_TOKEN_LENGTH".to_string(),
                "must be at least 4".to_string(),
            ));
        }

        Ok(Self {
            owner_token,
            token_length,
            default_token_days: parse_env_or("WATCHPOST_TOKEN_DAYS", 1_u32)?,
            alert_min_role: parse_env_or("WATCHPOST_ALERT_ROLE", Role::Open)?,
            artifact_min_role: parse_env_or("WATCHPOST_ARTIFACT_ROLE", Role::Admin)?,
        })
    }
}

impl RecordingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let debounce_ticks = parse_env_or("WATCHPOST_DEBOUNCE_TICKS", defaults.debounce_ticks)?;
        let max_capture_ticks =
            parse_env_or("WATCHPOST_MAX_CAPTURE_TICKS", defaults.max_capture_ticks)?;
        if debounce_ticks == 0 || max_capture_ticks == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "WATCHPOST_*_TICKS".to_string(),
                "tick thresholds must be positive".to_string(),
            ));
        }
        let tick_ms = parse_env_or("WATCHPOST_TICK_MS", 1000_u64)?;

        Ok(Self {
            debounce_ticks,
            max_capture_ticks,
            tick_interval: Duration::from_millis(tick_ms),
            start_paused: parse_env_or("WATCHPOST_START_PAUSED", defaults.start_paused)?,
        })
    }
}

impl HardwareConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let poll_ms = parse_env_or("WATCHPOST_SENSOR_POLL_MS", 100_u64)?;

        Ok(Self {
            video_dir: get_optional_env("WATCHPOST_VIDEO_DIR")
                .map_or(defaults.video_dir, PathBuf::from),
            capture_cmd: get_env_or_default("WATCHPOST_CAPTURE_CMD", DEFAULT_CAPTURE_CMD),
            convert_cmd: get_env_or_default("WATCHPOST_CONVERT_CMD", DEFAULT_CONVERT_CMD),
            sensor_path: get_optional_env("WATCHPOST_SENSOR_PATH")
                .map_or(defaults.sensor_path, PathBuf::from),
            sensor_poll: Duration::from_millis(poll_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default`.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Check a candidate owner activation token against the startup rules.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the value is too short, looks like
/// a placeholder, or has too little entropy.
pub fn validate_owner_secret(value: &str) -> Result<(), ConfigError> {
    validate_secret_strength(value, "WATCHPOST_OWNER_TOKEN")?;
    validate_owner_token(&SecretString::from(value.to_string()), "WATCHPOST_OWNER_TOKEN")
}

/// Validate that the owner activation token is long enough to resist guessing.
fn validate_owner_token(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_OWNER_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_OWNER_TOKEN_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("<OWNER_ACTIVATION_TOKEN>", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("AAAAAAAAAAAA", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("Q7XK2M9PLZ4W", "TEST_VAR").is_ok());
        assert!(
            validate_secret_strength("123456789:AAHf9xZ-kq3LmN8pQrStUvWxYz0123456", "TEST_VAR")
                .is_ok()
        );
    }

    #[test]
    fn test_validate_owner_secret() {
        assert!(validate_owner_secret("Q7XK2M9PLZ4W").is_ok());
        assert!(validate_owner_secret("Q7XK2").is_err());
        assert!(validate_owner_secret("your-owner-token").is_err());
    }

    #[test]
    fn test_validate_owner_token_too_short() {
        let secret = SecretString::from("Q7XK2");
        assert!(validate_owner_token(&secret, "TEST_OWNER").is_err());
    }

    #[test]
    fn test_recording_defaults() {
        let config = RecordingConfig::default();
        assert_eq!(config.debounce_ticks, 2);
        assert_eq!(config.max_capture_ticks, 30);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(!config.start_paused);
    }

    #[test]
    fn test_access_defaults() {
        let config = AccessConfig::new(SecretString::from("Q7XK2M9PLZ4W"));
        assert_eq!(config.token_length, 8);
        assert_eq!(config.default_token_days, 1);
        assert_eq!(config.alert_min_role, Role::Open);
        assert_eq!(config.artifact_min_role, Role::Admin);
    }

    #[test]
    fn test_telegram_config_debug_redacts_secrets() {
        let config = TelegramConfig {
            bot_token: SecretString::from("123456789:super-secret-bot-token"),
            api_base: DEFAULT_TELEGRAM_API.to_string(),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.telegram.org"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-bot-token"));
    }

    #[test]
    fn test_access_config_debug_redacts_owner_token() {
        let config = AccessConfig::new(SecretString::from("OWNERSECRET42"));
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("OWNERSECRET42"));
    }
}
