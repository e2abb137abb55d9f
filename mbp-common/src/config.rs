//! Configuration file resolution and loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/mbp/config.toml`), if it exists
//! 4. None: callers fall back to built-in defaults

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "MBP_CONFIG";

/// Resolve which configuration file to load, if any
///
/// An explicitly named file (CLI or environment) is returned even if it does
/// not exist, so that loading it reports a useful error. The platform default
/// is only returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        debug!("Using config file from command line: {}", path.display());
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            debug!("Using config file from {}: {}", env_var_name, path);
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform default location
    default_config_path().filter(|path| path.exists())
}

/// Platform default configuration file path
///
/// - Linux: `~/.config/mbp/config.toml`
/// - macOS: `~/Library/Application Support/mbp/config.toml`
/// - Windows: `%APPDATA%\mbp\config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mbp").join("config.toml"))
}

/// Parse a TOML document into a configuration type
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
}

/// Read and parse a TOML configuration file
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    parse_toml(&content)
}
