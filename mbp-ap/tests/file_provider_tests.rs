//! File provider integration tests
//!
//! Generate small WAV files with hound and play them through the symphonia
//! backed provider, both directly and inside a session.

mod helpers;

use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use helpers::{generate_silent_wav, generate_sine_wav, wait_for_state};
use mbp_ap::playback::{AcquireRequest, Generation, ResourceProvider, SessionConfig, StatusEvent, StatusReporter};
use mbp_ap::provider::FileProvider;
use mbp_ap::Session;
use mbp_common::events::{EventBus, SessionEvent, TransportState};
use mbp_common::TrackReference;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn request(track: TrackReference, autoplay: bool) -> (AcquireRequest, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = StatusReporter::new(Generation::default(), tx);
    (
        AcquireRequest {
            track,
            autoplay,
            reporter,
        },
        rx,
    )
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> StatusEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for status event")
        .expect("status channel closed")
}

/// Skip progress updates until a finished, error or release event
async fn next_significant(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> StatusEvent {
    loop {
        let event = next_event(rx).await;
        let is_progress = event.loaded && !event.finished && event.error.is_none();
        if !is_progress {
            return event;
        }
    }
}

#[tokio::test]
async fn test_wav_loads_and_finishes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sine.wav");
    generate_sine_wav(&path, 300, 440.0, 0.5).unwrap();

    let mut provider = FileProvider::new(Duration::from_millis(50));
    let (req, mut rx) = request(TrackReference::from_path(&path), true);
    provider.acquire(req);

    let loaded = next_event(&mut rx).await;
    assert!(loaded.loaded);
    assert!(loaded.playing);
    assert!(loaded.error.is_none());
    assert!((290..=310).contains(&loaded.duration_ms), "duration {}", loaded.duration_ms);

    let finished = next_significant(&mut rx).await;
    assert!(finished.finished, "expected finished, got {:?}", finished);
    assert!(finished.position_ms >= 290);

    provider.release(Generation::default());
    let released = next_event(&mut rx).await;
    assert!(released.is_release_ack());
    assert_eq!(provider.active_resources(), 0);
}

#[tokio::test]
async fn test_missing_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let mut provider = FileProvider::default();
    let (req, mut rx) = request(TrackReference::from_path(dir.path().join("missing.flac")), true);
    provider.acquire(req);

    let event = next_event(&mut rx).await;
    let error = event.error.expect("expected an error event");
    assert!(error.contains("missing.flac"), "error: {}", error);
    assert!(!event.loaded);
}

#[tokio::test]
async fn test_garbage_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noise.mp3");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let mut provider = FileProvider::default();
    let (req, mut rx) = request(TrackReference::from_path(&path), true);
    provider.acquire(req);

    assert!(next_event(&mut rx).await.error.is_some());
}

#[tokio::test]
async fn test_unsupported_scheme_fails_without_worker() {
    let mut provider = FileProvider::default();
    let (req, mut rx) = request(TrackReference::new("content://media/external/audio/7"), true);
    provider.acquire(req);

    let event = next_event(&mut rx).await;
    assert!(event.error.unwrap().contains("content"));
    assert_eq!(provider.active_resources(), 0);
}

#[tokio::test]
async fn test_release_mid_playback_is_acknowledged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("long.wav");
    generate_silent_wav(&path, 5000).unwrap();

    let mut provider = FileProvider::new(Duration::from_millis(20));
    let (req, mut rx) = request(TrackReference::from_path(&path), true);
    provider.acquire(req);
    assert!(next_event(&mut rx).await.loaded);

    provider.release(Generation::default());
    let event = next_significant(&mut rx).await;
    assert!(event.is_release_ack(), "expected release ack, got {:?}", event);
    assert!(timeout(EVENT_TIMEOUT, rx.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_without_autoplay_waits_for_set_playing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.wav");
    generate_silent_wav(&path, 200).unwrap();

    let mut provider = FileProvider::new(Duration::from_millis(20));
    let (req, mut rx) = request(TrackReference::from_path(&path), false);
    provider.acquire(req);

    let loaded = next_event(&mut rx).await;
    assert!(loaded.loaded);
    assert!(!loaded.playing);

    // Nothing happens while output is stopped
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_err());

    provider.set_playing(Generation::default(), true);
    let resumed = next_event(&mut rx).await;
    assert!(resumed.playing);

    let finished = next_significant(&mut rx).await;
    assert!(finished.finished);
}

#[tokio::test]
async fn test_session_auto_advances_through_wav_files() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("01 first.wav");
    let second = dir.path().join("02 second.wav");
    generate_sine_wav(&first, 200, 440.0, 0.5).unwrap();
    generate_sine_wav(&second, 5000, 660.0, 0.5).unwrap();

    let provider = FileProvider::new(Duration::from_millis(50));
    let (handle, task) = Session::spawn(provider, SessionConfig::default(), EventBus::new(1024));
    let mut rx = handle.subscribe();

    let first_ref = TrackReference::from_path(&first);
    let second_ref = TrackReference::from_path(&second);
    handle
        .set_playlist(vec![first_ref.clone(), second_ref.clone()], 0)
        .await
        .unwrap();
    handle.play().await.unwrap();

    let snapshot = wait_for_state(&handle, TransportState::Playing, second_ref.locator()).await;
    assert_eq!(snapshot.cursor, 1);
    assert!((4990..=5010).contains(&snapshot.duration_ms));

    let mut finished_first = false;
    let mut auto_advanced = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            SessionEvent::TrackFinished { track, .. } => {
                finished_first |= track == first_ref;
            }
            SessionEvent::TrackChanged {
                track,
                auto_advance,
                ..
            } => {
                auto_advanced |= auto_advance && track == second_ref;
            }
            _ => {}
        }
    }
    assert!(finished_first);
    assert!(auto_advanced);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
