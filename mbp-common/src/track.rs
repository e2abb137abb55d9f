//! Track references supplied by the catalog
//!
//! A `TrackReference` is the only thing the playback core knows about an audio
//! item: an opaque locator (URI or filesystem path) and an optional display
//! title. Identity is the locator alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Opaque, comparable reference to a playable audio item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackReference {
    locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl TrackReference {
    /// Create a reference from a locator (URI or path)
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            title: None,
        }
    }

    /// Create a reference for a local file, titled with its file name
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            locator: path.to_string_lossy().into_owned(),
            title: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }

    /// Attach a display title (does not affect identity)
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Title if present, otherwise the locator
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.locator)
    }
}

impl PartialEq for TrackReference {
    fn eq(&self, other: &Self) -> bool {
        self.locator == other.locator
    }
}

impl Eq for TrackReference {}

impl Hash for TrackReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.locator.hash(state);
    }
}

impl fmt::Display for TrackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
