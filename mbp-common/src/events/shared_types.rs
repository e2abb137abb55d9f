//! Shared type definitions for event data

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::playback_types::TransportState;
use crate::track::TrackReference;

/// Point-in-time view of a playback session
///
/// Returned by `current_state()` and suitable for observers that poll rather
/// than subscribe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// Session this snapshot belongs to
    pub session_id: Uuid,
    /// Current transport state
    pub state: TransportState,
    /// Track at the playlist cursor (None when the playlist is empty)
    pub current_track: Option<TrackReference>,
    /// Playlist cursor (0 when the playlist is empty)
    pub cursor: usize,
    /// Number of tracks in the playlist
    pub playlist_len: usize,
    /// Last reported position in milliseconds
    pub position_ms: u64,
    /// Last reported duration in milliseconds
    pub duration_ms: u64,
    /// Current resource generation
    pub generation: u64,
    /// Failure recorded by the last transition into `Error`
    pub last_error: Option<String>,
}
