//! Tests for configuration file resolution
//!
//! Uses serial_test to prevent environment variable race conditions.
//! Tests that manipulate MBP_CONFIG are marked with #[serial].

use mbp_common::config::{load_toml_file, resolve_config_path, CONFIG_ENV_VAR};
use mbp_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct SampleConfig {
    name: String,
    #[serde(default)]
    count: u32,
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_overrides_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_ne!(resolved, Some(PathBuf::from("")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_load_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"session\"\ncount = 3").unwrap();

    let config: SampleConfig = load_toml_file(file.path()).unwrap();
    assert_eq!(config.name, "session");
    assert_eq!(config.count, 3);
}

#[test]
fn test_load_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");

    let result = load_toml_file::<SampleConfig>(&missing);
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("missing.toml")),
        other => panic!("Expected config error, got {:?}", other),
    }
}
