//! # MBP Audio Player Library (mbp-ap)
//!
//! Playback session controller for the media browser.
//!
//! **Purpose:** Own a single live audio resource per listening session, advance
//! through an ordered playlist, and serialize overlapping transport requests
//! (play, pause, next, previous, stop, replace playlist).
//!
//! **Architecture:** One tokio task per session owns the transport state
//! machine. Resource acquires are tagged with a generation number so that
//! completion events from superseded resources are recognized and dropped.

pub mod config;
pub mod error;
pub mod playback;
pub mod provider;

pub use error::{Error, Result};
pub use playback::{Session, SessionHandle};
