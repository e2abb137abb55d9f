//! Resource provider implementations
//!
//! The session talks to the platform media subsystem only through the
//! `ResourceProvider` trait. `FileProvider` decodes local files with symphonia
//! on one worker thread per resource.

pub mod file;

pub use file::FileProvider;
