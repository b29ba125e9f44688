//! Unit tests for bootstrap configuration and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files SHALL NOT cause termination
//! - Partial TOML files fall back to defaults per field
//! - Priority order for data folder resolution
//! - Invalid scheduler values are rejected
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CLICKSYNC_DATA_FOLDER are marked with #[serial].

use clicksync_common::config::{
    ensure_data_folder, resolve_data_folder, TomlConfig, DATA_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = TomlConfig::load_or_default(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_partial_config_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
port = 9000

[scheduler]
period_secs = 0.5
remaining = 8

[calibration]
max_match_distance = 12
"#,
    )
    .unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.scheduler.period_secs, 0.5);
    assert_eq!(config.scheduler.remaining, 8);
    assert_eq!(config.scheduler.lookahead_secs, 1.0);
    assert_eq!(config.scheduler.tick_ms, 25);
    assert!(config.scheduler.active);
    assert_eq!(config.calibration.max_match_distance, Some(12));
    assert_eq!(config.calibration_file, "web-audio-calibration.json");
    assert!(config.logging.level.is_none());
}

#[test]
fn test_invalid_scheduler_values_rejected() {
    assert!(TomlConfig::parse("[scheduler]\nperiod_secs = 0.0\n").is_err());
    assert!(TomlConfig::parse("[scheduler]\nlookahead_secs = -1.0\n").is_err());
    assert!(TomlConfig::parse("[scheduler]\nlookahead_secs = 0.0\n").is_err());
    assert!(TomlConfig::parse("[scheduler]\nremaining = -5\n").is_err());
    assert!(TomlConfig::parse("[scheduler]\ntick_ms = 0\n").is_err());
    assert!(TomlConfig::parse("port = \"not a number\"\n").is_err());
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins() {
    env::set_var(DATA_FOLDER_ENV, "/tmp/clicksync-env-folder");
    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/clicksync-toml-folder")),
        ..Default::default()
    };

    let resolved = resolve_data_folder(Some(Path::new("/tmp/clicksync-cli-folder")), &config);
    assert_eq!(resolved, PathBuf::from("/tmp/clicksync-cli-folder"));

    env::remove_var(DATA_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(DATA_FOLDER_ENV, "/tmp/clicksync-env-folder");
    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/clicksync-toml-folder")),
        ..Default::default()
    };

    assert_eq!(
        resolve_data_folder(None, &config),
        PathBuf::from("/tmp/clicksync-env-folder")
    );

    env::remove_var(DATA_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_then_default() {
    env::remove_var(DATA_FOLDER_ENV);

    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/clicksync-toml-folder")),
        ..Default::default()
    };
    assert_eq!(
        resolve_data_folder(None, &config),
        PathBuf::from("/tmp/clicksync-toml-folder")
    );

    let fallback = resolve_data_folder(None, &TomlConfig::default());
    assert!(!fallback.as_os_str().is_empty());
}

#[test]
fn test_ensure_data_folder_creates_once() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("nested").join("data");

    assert!(ensure_data_folder(&folder).unwrap());
    assert!(folder.is_dir());
    assert!(!ensure_data_folder(&folder).unwrap());
}
