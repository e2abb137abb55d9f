//! Ordered track list with a wrapping cursor
//!
//! The playlist is owned exclusively by the transport state machine. Items and
//! cursor only change together through `replace`, or the cursor alone through
//! `advance`.

use mbp_common::TrackReference;

/// Direction of a cursor move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Ordered sequence of tracks plus the current index
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    items: Vec<TrackReference>,
    cursor: usize,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace items and cursor together
    ///
    /// The cursor is clamped into `0..len`. An empty list leaves the cursor at 0.
    pub fn replace(&mut self, items: Vec<TrackReference>, start_index: usize) {
        self.cursor = if items.is_empty() {
            0
        } else {
            start_index.min(items.len() - 1)
        };
        self.items = items;
    }

    /// Move the cursor one step, wrapping at both ends
    ///
    /// Returns the track now at the cursor, or None (no-op) if the playlist is empty.
    pub fn advance(&mut self, direction: Direction) -> Option<&TrackReference> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        self.cursor = match direction {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };
        self.items.get(self.cursor)
    }

    /// Track at the cursor
    pub fn current_track(&self) -> Option<&TrackReference> {
        self.items.get(self.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn items(&self) -> &[TrackReference] {
        &self.items
    }
}
