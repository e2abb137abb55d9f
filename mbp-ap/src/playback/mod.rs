//! Playback session: playlist, resource lifecycle and transport state machine

pub mod events;
pub mod playlist;
pub mod resource;
pub mod session;
pub mod transport;

pub use events::{Generation, StatusEvent, StatusReporter};
pub use playlist::{Direction, Playlist};
pub use resource::{AcquireRequest, ResourceController, ResourceProvider, ResourceSlot};
pub use session::{Session, SessionConfig, SessionHandle};
pub use transport::{Transport, TransportCommand};
