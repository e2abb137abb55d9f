//! # MBP Common Library
//!
//! Shared code for the media browser playback crates:
//! - Track references handed over by the catalog
//! - Transport state and observer event types (SessionEvent enum)
//! - EventBus for session-state-changed notifications
//! - Configuration file resolution

pub mod config;
pub mod error;
pub mod events;
pub mod track;

pub use error::{Error, Result};
pub use track::TrackReference;
