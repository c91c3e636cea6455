//! Tests for data directory resolution and config file loading
//!
//! Covers the priority order CLI > environment > TOML > compiled default,
//! and graceful fallback when the config file is missing or broken.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SCANTDE_DATA_DIR or SCANTDE_CONFIG are marked with
//! #[serial] so they run sequentially.

use scantde_common::config::{
    default_data_dir, DataDirResolver, TomlConfig, CONFIG_FILE_ENV, DATA_DIR_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(DATA_DIR_ENV);

    let resolver = DataDirResolver::new(&TomlConfig::default());
    let data_dir = resolver.resolve(None);

    assert!(!data_dir.as_os_str().is_empty());
    assert_eq!(data_dir, default_data_dir());
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(DATA_DIR_ENV, "/tmp/scantde-test-env");

    let config = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/scantde-test-toml")),
        ..Default::default()
    };
    let data_dir = DataDirResolver::new(&config).resolve(None);
    assert_eq!(data_dir, PathBuf::from("/tmp/scantde-test-env"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_resolver_blank_env_var_is_ignored() {
    env::set_var(DATA_DIR_ENV, "   ");

    let config = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/scantde-test-toml")),
        ..Default::default()
    };
    let data_dir = DataDirResolver::new(&config).resolve(None);
    assert_eq!(data_dir, PathBuf::from("/tmp/scantde-test-toml"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_load_or_default_reads_env_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "models_dir = \"/models\"\n[logging]\nlevel = \"warn\"\n").unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::load_or_default();
    assert_eq!(config.models_dir, Some(PathBuf::from("/models")));
    assert_eq!(config.logging.level, "warn");

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_load_or_default_survives_broken_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::load_or_default();
    assert!(config.data_dir.is_none());
    assert_eq!(config.logging.level, "info");

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
fn test_load_missing_file_is_config_error() {
    let err = TomlConfig::load(std::path::Path::new("/nonexistent/scantde.toml")).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}
