//! Transport state machine
//!
//! Serializes play/pause/next/previous/stop/set_playlist against the current
//! transport state and resource generation. Every operation either applies a
//! pure state change or issues at most one resource action before returning.
//! Status events are honoured only for the current generation.
//!
//! The state machine is synchronous and single-owner; the session task in
//! `session.rs` provides the serialized entry point.

use tracing::{debug, info, warn};
use uuid::Uuid;

use mbp_common::events::{EventBus, SessionEvent, SessionSnapshot, TransportState};
use mbp_common::TrackReference;

use super::events::{StatusEvent, StatusSender};
use super::playlist::{Direction, Playlist};
use super::resource::{ResourceController, ResourceProvider};
use crate::error::{Error, Result};

/// Transport request accepted by the session
#[derive(Debug, Clone)]
pub enum TransportCommand {
    SetPlaylist {
        tracks: Vec<TrackReference>,
        start_index: usize,
    },
    Play,
    Pause,
    Next,
    Previous,
    Stop,
}

/// Session-owned transport state machine
pub struct Transport<P> {
    session_id: Uuid,
    playlist: Playlist,
    resource: ResourceController<P>,
    state: TransportState,
    autoplay: bool,
    position_ms: u64,
    duration_ms: u64,
    last_error: Option<String>,
    /// Natural end reported while paused; acted on at the next play()
    finished_while_paused: bool,
    events: EventBus,
}

impl<P: ResourceProvider> Transport<P> {
    pub fn new(
        session_id: Uuid,
        provider: P,
        status_tx: StatusSender,
        events: EventBus,
        autoplay: bool,
    ) -> Self {
        Self {
            session_id,
            playlist: Playlist::new(),
            resource: ResourceController::new(provider, status_tx),
            state: TransportState::Idle,
            autoplay,
            position_ms: 0,
            duration_ms: 0,
            last_error: None,
            finished_while_paused: false,
            events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn resource(&self) -> &ResourceController<P> {
        &self.resource
    }

    pub fn current_track(&self) -> Option<&TrackReference> {
        self.playlist.current_track()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state,
            current_track: self.playlist.current_track().cloned(),
            cursor: self.playlist.cursor(),
            playlist_len: self.playlist.len(),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            generation: self.resource.generation().value(),
            last_error: self.last_error.clone(),
        }
    }

    /// Dispatch a transport command
    pub fn apply(&mut self, command: TransportCommand) -> Result<()> {
        match command {
            TransportCommand::SetPlaylist {
                tracks,
                start_index,
            } => {
                self.set_playlist(tracks, start_index);
                Ok(())
            }
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Next => self.next(),
            TransportCommand::Previous => self.previous(),
            TransportCommand::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Replace the playlist; playback must be restarted with play()
    pub fn set_playlist(&mut self, tracks: Vec<TrackReference>, start_index: usize) {
        self.resource.release();
        self.playlist.replace(tracks, start_index);
        self.reset_progress();
        self.last_error = None;

        info!(
            "Playlist replaced: {} tracks, cursor {}",
            self.playlist.len(),
            self.playlist.cursor()
        );
        self.events.emit_lossy(SessionEvent::PlaylistReplaced {
            session_id: self.session_id,
            len: self.playlist.len(),
            cursor: self.playlist.cursor(),
            timestamp: chrono::Utc::now(),
        });
        self.set_state(TransportState::Idle);
    }

    pub fn play(&mut self) -> Result<()> {
        match self.state {
            TransportState::Loading | TransportState::Playing => {
                debug!("play() ignored: already {}", self.state);
                Ok(())
            }
            TransportState::Paused if self.finished_while_paused => {
                self.skip(Direction::Forward, true)
            }
            TransportState::Paused => {
                self.resource.set_playing(true)?;
                self.set_state(TransportState::Playing);
                Ok(())
            }
            TransportState::Idle | TransportState::Stopped | TransportState::Error => {
                let track = self.playlist.current_track().cloned().ok_or_else(|| {
                    debug!("play() with empty playlist: nothing to play");
                    Error::EmptyPlaylist
                })?;
                self.begin_loading(track);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            TransportState::Playing => {
                self.resource.set_playing(false)?;
                self.set_state(TransportState::Paused);
                Ok(())
            }
            _ => {
                debug!("pause() ignored in state {}", self.state);
                Ok(())
            }
        }
    }

    pub fn next(&mut self) -> Result<()> {
        self.skip(Direction::Forward, false)
    }

    pub fn previous(&mut self) -> Result<()> {
        self.skip(Direction::Backward, false)
    }

    /// Release the resource, keep the cursor
    pub fn stop(&mut self) {
        self.resource.release();
        self.reset_progress();
        self.set_state(TransportState::Stopped);
    }

    /// Apply a status event from the resource provider
    pub fn handle_status(&mut self, event: StatusEvent) {
        let Some(event) = self.resource.accept(event) else {
            return;
        };

        if let Some(error) = event.error {
            warn!(
                "Playback failed for {}: {}",
                self.track_label(),
                error
            );
            self.last_error = Some(error.clone());
            self.events.emit_lossy(SessionEvent::PlaybackFailed {
                session_id: self.session_id,
                track: self.playlist.current_track().cloned(),
                error,
                timestamp: chrono::Utc::now(),
            });
            self.set_state(TransportState::Error);
            return;
        }

        self.position_ms = event.position_ms;
        self.duration_ms = event.duration_ms;

        if self.state == TransportState::Loading {
            if !event.playing {
                // Provider loaded without starting output
                if let Err(e) = self.resource.set_playing(true) {
                    warn!("Could not start output after load: {}", e);
                }
            }
            self.set_state(TransportState::Playing);
        }

        if let Some(track) = self.playlist.current_track() {
            self.events.emit_lossy(SessionEvent::PlaybackProgress {
                session_id: self.session_id,
                track: track.clone(),
                position_ms: self.position_ms,
                duration_ms: self.duration_ms,
                playing: self.state == TransportState::Playing,
                timestamp: chrono::Utc::now(),
            });
        }

        if event.finished {
            self.handle_finished();
        }
    }

    /// Release all resources before the session goes away
    pub fn shutdown(&mut self) {
        self.resource.shutdown();
        self.set_state(TransportState::Stopped);
    }

    fn handle_finished(&mut self) {
        if let Some(track) = self.playlist.current_track() {
            info!("Track finished: {}", track);
            self.events.emit_lossy(SessionEvent::TrackFinished {
                session_id: self.session_id,
                track: track.clone(),
                timestamp: chrono::Utc::now(),
            });
        }

        match self.state {
            TransportState::Playing => {
                if let Err(e) = self.skip(Direction::Forward, true) {
                    warn!("Auto-advance failed: {}", e);
                }
            }
            TransportState::Paused => {
                self.finished_while_paused = true;
            }
            _ => {}
        }
    }

    fn skip(&mut self, direction: Direction, auto_advance: bool) -> Result<()> {
        let track = self
            .playlist
            .advance(direction)
            .cloned()
            .ok_or(Error::EmptyPlaylist)?;

        debug!(
            "Skipping {:?} to cursor {} (auto_advance={})",
            direction,
            self.playlist.cursor(),
            auto_advance
        );
        self.events.emit_lossy(SessionEvent::TrackChanged {
            session_id: self.session_id,
            track: track.clone(),
            cursor: self.playlist.cursor(),
            auto_advance,
            timestamp: chrono::Utc::now(),
        });
        self.begin_loading(track);
        Ok(())
    }

    fn begin_loading(&mut self, track: TrackReference) {
        self.reset_progress();
        self.last_error = None;
        self.resource.acquire(track, self.autoplay);
        self.set_state(TransportState::Loading);
    }

    fn reset_progress(&mut self) {
        self.position_ms = 0;
        self.duration_ms = 0;
        self.finished_while_paused = false;
    }

    fn set_state(&mut self, new_state: TransportState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;

        debug!("Transport {} -> {} ({})", old_state, new_state, self.track_label());
        self.events.emit_lossy(SessionEvent::StateChanged {
            session_id: self.session_id,
            old_state,
            new_state,
            current_track: self.playlist.current_track().cloned(),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            timestamp: chrono::Utc::now(),
        });
    }

    fn track_label(&self) -> String {
        self.playlist
            .current_track()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "<no track>".to_string())
    }
}
