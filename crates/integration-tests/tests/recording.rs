//! Integration tests for motion to recording to delivery.
//!
//! Every test runs on a paused clock, so drain timer ticks are instant and
//! deterministic.

use std::time::Duration;

use watchpost_bot::config::RecordingConfig;
use watchpost_bot::services::recorder::START_ALERT;
use watchpost_core::{Role, SubscriberId};
use watchpost_integration_tests::{FakeCamera, OWNER, TestContext};

const ADMIN: SubscriberId = SubscriberId::new(40);
const SUB: SubscriberId = SubscriberId::new(41);

async fn watched(recording: RecordingConfig) -> TestContext {
    let ctx = TestContext::with_recording(recording).await;
    ctx.command(OWNER, "activate", &[watchpost_integration_tests::OWNER_TOKEN])
        .await;
    ctx.subscribe(ADMIN, Role::Admin).await;
    ctx.subscribe(SUB, Role::Sub).await;
    ctx.transport.clear().await;
    ctx
}

/// Let the delivery worker drain until `count` videos went out.
async fn wait_for_videos(ctx: &TestContext, count: usize) {
    for _ in 0..100 {
        if ctx.transport.videos().await.len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {count} videos, got {:?}",
        ctx.transport.videos().await
    );
}

#[tokio::test(start_paused = true)]
async fn test_debounced_recording_is_delivered() {
    let ctx = watched(RecordingConfig::default()).await;

    let task = ctx.state.recorder().on_motion_edge(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5500)).await;
    ctx.state.recorder().on_motion_edge(false).await;
    task.await.unwrap();

    assert_eq!(ctx.camera.starts(), 1);
    assert_eq!(ctx.camera.stops(), 1);

    // Everyone gets the alert.
    for id in [OWNER, ADMIN, SUB] {
        assert_eq!(ctx.last_text(id).await.as_deref(), Some(START_ALERT));
    }

    // Only admins and up get the recording.
    wait_for_videos(&ctx, 2).await;
    let mut recipients: Vec<_> = ctx
        .transport
        .videos()
        .await
        .into_iter()
        .map(|(to, path)| {
            assert_eq!(path, FakeCamera::artifact_path(1));
            to
        })
        .collect();
    recipients.sort();
    assert_eq!(recipients, vec![OWNER, ADMIN]);
}

#[tokio::test(start_paused = true)]
async fn test_status_during_recording() {
    let ctx = watched(RecordingConfig::default()).await;

    let task = ctx.state.recorder().on_motion_edge(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    ctx.command(SUB, "status", &[]).await;
    assert_eq!(
        ctx.last_text(SUB).await.as_deref(),
        Some("Surveillance: active\nRecorder: recording (3 ticks)\nMotion: detected")
    );

    ctx.state.recorder().on_motion_edge(false).await;
    task.await.unwrap();

    ctx.command(SUB, "status", &[]).await;
    assert_eq!(
        ctx.last_text(SUB).await.as_deref(),
        Some("Surveillance: active\nRecorder: idle\nMotion: none")
    );
}

#[tokio::test(start_paused = true)]
async fn test_max_duration_restarts_until_paused() {
    let ctx = watched(RecordingConfig {
        debounce_ticks: 2,
        max_capture_ticks: 30,
        tick_interval: Duration::from_secs(1),
        start_paused: false,
    })
    .await;

    // Motion never stops.
    let task = ctx.state.recorder().on_motion_edge(true).await.unwrap();

    tokio::time::sleep(Duration::from_millis(30_500)).await;
    assert_eq!(ctx.camera.starts(), 2);
    assert_eq!(ctx.camera.stops(), 1);

    ctx.command(ADMIN, "pause", &[]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("Surveillance paused. A recording in progress will finish normally.")
    );

    // The second capture runs to its cap and does not restart.
    task.await.unwrap();
    assert_eq!(ctx.camera.starts(), 2);
    assert_eq!(ctx.camera.stops(), 2);
    assert!(!ctx.state.recorder().camera_recording());

    wait_for_videos(&ctx, 4).await;
    let paths: Vec<_> = ctx
        .transport
        .videos()
        .await
        .into_iter()
        .filter(|(to, _)| *to == OWNER)
        .map(|(_, path)| path)
        .collect();
    assert_eq!(
        paths,
        vec![FakeCamera::artifact_path(1), FakeCamera::artifact_path(2)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_paused_surveillance_ignores_motion() {
    let ctx = watched(RecordingConfig::default()).await;

    ctx.command(ADMIN, "pause", &[]).await;
    ctx.command(ADMIN, "pause", &[]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("Surveillance is already paused.")
    );

    assert!(ctx.state.recorder().on_motion_edge(true).await.is_none());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(ctx.camera.starts(), 0);
    assert!(ctx.transport.texts_to(SUB).await.is_empty());

    ctx.command(SUB, "status", &[]).await;
    assert!(
        ctx.last_text(SUB)
            .await
            .unwrap()
            .starts_with("Surveillance: paused")
    );

    ctx.command(ADMIN, "unpause", &[]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("Surveillance resumed.")
    );
    ctx.command(ADMIN, "unpause", &[]).await;
    assert_eq!(
        ctx.last_text(ADMIN).await.as_deref(),
        Some("Surveillance is already active.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_start_paused() {
    let ctx = watched(RecordingConfig {
        start_paused: true,
        ..RecordingConfig::default()
    })
    .await;

    assert!(ctx.state.recorder().status().await.paused);
    assert!(ctx.state.recorder().on_motion_edge(true).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_camera_failure_recovers() {
    let ctx = watched(RecordingConfig::default()).await;
    ctx.camera.set_fail_start(true);

    let task = ctx.state.recorder().on_motion_edge(true).await.unwrap();
    task.await.unwrap();
    assert!(ctx.transport.texts_to(SUB).await.is_empty());

    // The next start edge tries again.
    ctx.camera.set_fail_start(false);
    ctx.state.recorder().on_motion_edge(false).await;
    let task = ctx.state.recorder().on_motion_edge(true).await.unwrap();
    ctx.state.recorder().on_motion_edge(false).await;
    task.await.unwrap();

    assert_eq!(ctx.camera.starts(), 1);
    assert_eq!(ctx.last_text(SUB).await.as_deref(), Some(START_ALERT));
}
