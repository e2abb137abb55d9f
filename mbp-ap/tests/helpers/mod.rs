//! Test helper modules for mbp-ap integration tests
//!
//! - ScriptedProvider: in-memory resource provider driven by the test
//! - audio_generator: deterministic WAV fixtures via hound
//! - wait_for: poll a session until its snapshot satisfies a predicate

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod scripted_provider;

pub use audio_generator::{generate_silent_wav, generate_sine_wav};
pub use scripted_provider::{ProviderCall, ProviderControl, ScriptedProvider};

use std::time::Duration;

use mbp_ap::SessionHandle;
use mbp_common::events::{SessionSnapshot, TransportState};
use mbp_common::TrackReference;

/// Default time allowed for a session to reach an expected state
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `current_state()` until `predicate` holds
///
/// Panics with the last snapshot if `timeout` elapses first.
pub async fn wait_for<F>(handle: &SessionHandle, timeout: Duration, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let snapshot = handle.current_state().await.expect("session closed");
        if predicate(&snapshot) {
            return snapshot;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("Timed out waiting for session state, last snapshot: {:?}", snapshot);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until the session is in `state` with the given track current
pub async fn wait_for_state(
    handle: &SessionHandle,
    state: TransportState,
    locator: &str,
) -> SessionSnapshot {
    wait_for(handle, WAIT_TIMEOUT, |s| {
        s.state == state && s.current_track.as_ref().map(|t| t.locator()) == Some(locator)
    })
    .await
}

pub fn tracks(locators: &[&str]) -> Vec<TrackReference> {
    locators.iter().map(|l| TrackReference::new(*l)).collect()
}
