//! Configuration management for mbp-ap
//!
//! Bootstrap settings come from an optional TOML file located via
//! `mbp_common::config::resolve_config_path`. Every field has a built-in
//! default, so a missing file (or a file with missing sections) is valid.
//!
//! Command-line arguments override the file; see `main.rs`.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use mbp_common::config::{load_toml_file, parse_toml, resolve_config_path, CONFIG_ENV_VAR};
use mbp_common::events::DEFAULT_EVENT_CAPACITY;

use crate::error::{Error, Result};
use crate::playback::SessionConfig;

/// Configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Playback session settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Broadcast buffer for session events; slow observers lag past this
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Interval between position updates from the file provider
    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    /// Start output as soon as a track is loaded
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,

    /// Caller command queue capacity
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            position_interval_ms: default_position_interval_ms(),
            autoplay: default_autoplay(),
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_position_interval_ms() -> u64 {
    250
}

fn default_autoplay() -> bool {
    true
}

fn default_command_buffer() -> usize {
    32
}

impl TomlConfig {
    /// Load configuration, falling back to defaults when no file is found
    ///
    /// `cli_path` takes priority over `MBP_CONFIG` and the platform default.
    /// A file that was explicitly named but cannot be read is an error.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config = match resolve_config_path(cli_path, CONFIG_ENV_VAR) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_file::<TomlConfig>(&path)?
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                TomlConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Session construction parameters
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            autoplay: self.session.autoplay,
            command_buffer: self.session.command_buffer,
        }
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.session.position_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.session.event_capacity == 0 {
            return Err(Error::Config("session.event_capacity must be at least 1".to_string()));
        }
        if self.session.position_interval_ms == 0 {
            return Err(Error::Config(
                "session.position_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
