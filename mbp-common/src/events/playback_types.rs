//! Playback-related type definitions
//!
//! Supporting types for the transport state of a listening session.

use serde::{Deserialize, Serialize};

/// Transport state of a playback session
///
/// Exactly one state is current at any time; it belongs to the session,
/// not to individual tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// No playlist, or an empty one
    #[default]
    Idle,
    /// Resource acquire in flight for the track at the cursor
    Loading,
    Playing,
    Paused,
    /// Resource released, cursor retained
    Stopped,
    /// Last acquire or playback failed
    Error,
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Idle => write!(f, "idle"),
            TransportState::Loading => write!(f, "loading"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Error => write!(f, "error"),
        }
    }
}
