//! Event types for the MBP event system
//!
//! Provides the observer-facing session events and the EventBus that carries
//! them. Observers (UI, media keys, loggers) subscribe read-only; nothing
//! received here can mutate a session.

mod playback_types;
mod shared_types;

pub use playback_types::TransportState;
pub use shared_types::SessionSnapshot;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::track::TrackReference;

/// Default EventBus capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Session-state-changed notifications
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to out-of-process observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Transport state changed
    ///
    /// Triggers:
    /// - UI: Update transport controls and now-playing view
    /// - Platform integration: Update media keys / lock screen
    StateChanged {
        /// Session that changed
        session_id: Uuid,
        /// State before change
        old_state: TransportState,
        /// State after change
        new_state: TransportState,
        /// Track at the cursor after the change
        current_track: Option<TrackReference>,
        /// Last reported position (milliseconds)
        position_ms: u64,
        /// Last reported duration (milliseconds)
        duration_ms: u64,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Cursor moved to a different track (explicit skip or auto-advance)
    TrackChanged {
        session_id: Uuid,
        /// Track now at the cursor
        track: TrackReference,
        /// New cursor position
        cursor: usize,
        /// Whether the move was caused by natural end of the previous track
        auto_advance: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress update
    ///
    /// Emitted whenever the live resource reports position or duration.
    PlaybackProgress {
        session_id: Uuid,
        track: TrackReference,
        /// Current position (milliseconds)
        position_ms: u64,
        /// Total duration (milliseconds)
        duration_ms: u64,
        /// Whether output is running
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track reached its natural end
    TrackFinished {
        session_id: Uuid,
        track: TrackReference,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Acquire or playback failed; the session is now in `Error`
    PlaybackFailed {
        session_id: Uuid,
        track: Option<TrackReference>,
        /// Human-readable failure description
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist replaced wholesale
    PlaylistReplaced {
        session_id: Uuid,
        /// Number of tracks in the new playlist
        len: usize,
        /// Cursor after the replacement
        cursor: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::StateChanged { session_id, .. }
            | SessionEvent::TrackChanged { session_id, .. }
            | SessionEvent::PlaybackProgress { session_id, .. }
            | SessionEvent::TrackFinished { session_id, .. }
            | SessionEvent::PlaybackFailed { session_id, .. }
            | SessionEvent::PlaylistReplaced { session_id, .. } => *session_id,
        }
    }

    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "StateChanged",
            SessionEvent::TrackChanged { .. } => "TrackChanged",
            SessionEvent::PlaybackProgress { .. } => "PlaybackProgress",
            SessionEvent::TrackFinished { .. } => "TrackFinished",
            SessionEvent::PlaybackFailed { .. } => "PlaybackFailed",
            SessionEvent::PlaylistReplaced { .. } => "PlaylistReplaced",
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper around `tokio::sync::broadcast`. Slow subscribers lag and
/// lose the oldest events rather than blocking the session.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use mbp_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
