//! Internal resource status events (not exposed to observers)
//!
//! Resource providers report progress through `StatusEvent`s tagged with the
//! generation of the acquire that produced them. The session converts the
//! events it accepts into `mbp_common::events::SessionEvent`s before
//! broadcasting.

use std::fmt;
use tokio::sync::mpsc;

/// Monotonically increasing acquire/release counter
///
/// Carried on every status event; used only to tell current events from
/// stale ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Status report from a playback resource
///
/// Within one generation events arrive in emission order:
/// loaded → progress updates → finished or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub generation: Generation,
    /// Resource is decoded and ready for output
    pub loaded: bool,
    /// Output is running
    pub playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Natural end of track (at most once per resource)
    pub finished: bool,
    /// Acquire or playback failure; the resource is dead
    pub error: Option<String>,
}

impl StatusEvent {
    /// Load completed
    pub fn loaded(generation: Generation, duration_ms: u64, playing: bool) -> Self {
        Self {
            generation,
            loaded: true,
            playing,
            position_ms: 0,
            duration_ms,
            finished: false,
            error: None,
        }
    }

    /// Position/duration update for a loaded resource
    pub fn progress(generation: Generation, position_ms: u64, duration_ms: u64, playing: bool) -> Self {
        Self {
            generation,
            loaded: true,
            playing,
            position_ms,
            duration_ms,
            finished: false,
            error: None,
        }
    }

    /// Natural end of track
    pub fn finished(generation: Generation, duration_ms: u64) -> Self {
        Self {
            generation,
            loaded: true,
            playing: false,
            position_ms: duration_ms,
            duration_ms,
            finished: true,
            error: None,
        }
    }

    /// Acquire or playback failed
    pub fn failed(generation: Generation, error: impl Into<String>) -> Self {
        Self {
            generation,
            loaded: false,
            playing: false,
            position_ms: 0,
            duration_ms: 0,
            finished: false,
            error: Some(error.into()),
        }
    }

    /// Resource torn down after a release request
    pub fn released(generation: Generation) -> Self {
        Self {
            generation,
            loaded: false,
            playing: false,
            position_ms: 0,
            duration_ms: 0,
            finished: false,
            error: None,
        }
    }

    /// Whether this event acknowledges a completed release
    pub fn is_release_ack(&self) -> bool {
        !self.loaded && !self.finished && self.error.is_none()
    }
}

/// Channel end the session listens on for status events
pub type StatusSender = mpsc::UnboundedSender<StatusEvent>;
pub type StatusReceiver = mpsc::UnboundedReceiver<StatusEvent>;

/// Per-acquire handle for reporting status
///
/// Bound to a single generation, so a provider can only ever tag events with
/// the generation it was handed. Every method returns `false` once the session
/// has gone away, which providers use to stop their workers.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    generation: Generation,
    tx: StatusSender,
}

impl StatusReporter {
    pub fn new(generation: Generation, tx: StatusSender) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn loaded(&self, duration_ms: u64, playing: bool) -> bool {
        self.send(StatusEvent::loaded(self.generation, duration_ms, playing))
    }

    pub fn progress(&self, position_ms: u64, duration_ms: u64, playing: bool) -> bool {
        self.send(StatusEvent::progress(
            self.generation,
            position_ms,
            duration_ms,
            playing,
        ))
    }

    pub fn finished(&self, duration_ms: u64) -> bool {
        self.send(StatusEvent::finished(self.generation, duration_ms))
    }

    pub fn failed(&self, error: impl Into<String>) -> bool {
        self.send(StatusEvent::failed(self.generation, error))
    }

    pub fn released(&self) -> bool {
        self.send(StatusEvent::released(self.generation))
    }

    fn send(&self, event: StatusEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
