//! Playback session task and caller-facing handle
//!
//! Each session is an explicitly constructed object: one tokio task owns the
//! transport state machine, and both caller commands and provider status
//! events are funnelled through a single `select!` loop. That loop is the
//! only place session state is ever mutated.
//!
//! # Architecture
//!
//! - **Command channel** (tokio::mpsc + oneshot reply): caller → session
//! - **Status channel** (tokio::mpsc, unbounded): resource provider → session
//! - **EventBus** (tokio::broadcast): session → observers

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use mbp_common::events::{EventBus, SessionEvent, SessionSnapshot};
use mbp_common::TrackReference;

use super::events::StatusReceiver;
use super::resource::ResourceProvider;
use super::transport::{Transport, TransportCommand};
use crate::error::{Error, Result};

/// Session construction parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ask providers to start output as soon as a track is loaded
    pub autoplay: bool,
    /// Capacity of the caller command queue
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            command_buffer: 32,
        }
    }
}

enum Command {
    Transport {
        command: TransportCommand,
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Transport { command, .. } => write!(f, "Transport({:?})", command),
            Command::Snapshot { .. } => write!(f, "Snapshot"),
            Command::Shutdown { .. } => write!(f, "Shutdown"),
        }
    }
}

/// Session task state; consumed by `run`
pub struct Session<P> {
    transport: Transport<P>,
    commands: mpsc::Receiver<Command>,
    status_rx: StatusReceiver,
}

impl<P: ResourceProvider> Session<P> {
    /// Build a session and the handle that controls it
    ///
    /// Nothing runs until `run` is awaited (or use `spawn`).
    pub fn new(provider: P, config: SessionConfig, events: EventBus) -> (Self, SessionHandle) {
        let session_id = Uuid::new_v4();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::channel(config.command_buffer.max(1));

        let transport = Transport::new(session_id, provider, status_tx, events.clone(), config.autoplay);
        let handle = SessionHandle {
            session_id,
            tx: command_tx,
            events,
        };

        (
            Self {
                transport,
                commands,
                status_rx,
            },
            handle,
        )
    }

    /// Build a session and run it on the current tokio runtime
    pub fn spawn(provider: P, config: SessionConfig, events: EventBus) -> (SessionHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(provider, config, events);
        let task = tokio::spawn(session.run());
        (handle, task)
    }

    /// Process commands and status events until shutdown
    ///
    /// Exits on an explicit shutdown or when every handle has been dropped;
    /// either way the live resource is released first.
    pub async fn run(mut self) {
        let session_id = self.transport.session_id();
        info!("Playback session {} started", session_id);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Transport { command, reply }) => {
                        debug!("Session {} command: {:?}", session_id, command);
                        let result = self.transport.apply(command);
                        let _ = reply.send(result);
                    }
                    Some(Command::Snapshot { reply }) => {
                        let _ = reply.send(self.transport.snapshot());
                    }
                    Some(Command::Shutdown { reply }) => {
                        self.transport.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        debug!("All handles for session {} dropped", session_id);
                        self.transport.shutdown();
                        break;
                    }
                },
                Some(event) = self.status_rx.recv() => {
                    self.transport.handle_status(event);
                }
            }
        }

        info!("Playback session {} stopped", session_id);
    }
}

/// Caller-facing control surface of a session
///
/// Cheap to clone. Every operation returns as soon as the session has issued
/// at most one resource action; progress is reported through `subscribe()`.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: Uuid,
    tx: mpsc::Sender<Command>,
    events: EventBus,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Replace the playlist, releasing any live resource first
    pub async fn set_playlist(&self, tracks: Vec<TrackReference>, start_index: usize) -> Result<()> {
        self.transport(TransportCommand::SetPlaylist {
            tracks,
            start_index,
        })
        .await
    }

    pub async fn play(&self) -> Result<()> {
        self.transport(TransportCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.transport(TransportCommand::Pause).await
    }

    pub async fn next(&self) -> Result<()> {
        self.transport(TransportCommand::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.transport(TransportCommand::Previous).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.transport(TransportCommand::Stop).await
    }

    /// Current transport state, track and progress
    pub async fn current_state(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Subscribe to session-state-changed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Release the resource and stop the session task
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    async fn transport(&self, command: TransportCommand) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Transport { command, reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::SessionClosed)
    }
}
