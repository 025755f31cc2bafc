//! Watchpost - motion-triggered surveillance with a Telegram front-end.
//!
//! # Tasks
//!
//! - Telegram long polling, one spawned task per update
//! - Motion sensor poller feeding edges into the motion listener
//! - One capture task per recording (camera, drain timer, restart)
//! - Delivery worker uploading finished recordings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchpost_bot::config::BotConfig;
use watchpost_bot::hardware::{Camera, CommandCamera, SysfsSensor};
use watchpost_bot::state::AppState;
use watchpost_bot::telegram::{self, TelegramClient};
use watchpost_bot::transport::Transport;

/// Buffered motion edges between the sensor and the recorder.
const EDGE_QUEUE: usize = 32;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "watchpost_bot=info,watchpost=info".into());

    let json = std::env::var("WATCHPOST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (needed for Sentry init)
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let client = match TelegramClient::new(&config.telegram) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Telegram client");
            return ExitCode::FAILURE;
        }
    };

    let transport: Arc<dyn Transport> = Arc::new(client.clone());
    let camera: Arc<dyn Camera> = Arc::new(CommandCamera::new(&config.hardware));
    let (state, artifacts) = AppState::new(
        config.access.clone(),
        config.recording.clone(),
        transport,
        camera,
    );
    state.bootstrap_owner().await;

    let delivery = state.notifier().clone().spawn_delivery_worker(artifacts);
    let (edges_tx, edges_rx) = mpsc::channel(EDGE_QUEUE);
    let motion = state.recorder().clone().spawn_motion_listener(edges_rx);
    let sensor = SysfsSensor::new(&config.hardware).spawn(edges_tx);

    tracing::info!(
        paused = config.recording.start_paused,
        debounce_ticks = config.recording.debounce_ticks,
        max_capture_ticks = config.recording.max_capture_ticks,
        "Watchpost started"
    );

    tokio::select! {
        () = telegram::run_polling(client, state.clone()) => {},
        () = shutdown_signal() => {},
    }

    sensor.abort();
    motion.abort();
    delivery.abort();

    tracing::info!("Watchpost stopped");
    ExitCode::SUCCESS
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
