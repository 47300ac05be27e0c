use std::{path::PathBuf, time::Duration};

use servitor_core::BusScope;
use servitor_logging::LogLevel;
use tempfile::tempdir;
use tracing::Level;

use crate::{ServiceSettings, SettingsStore};

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("servitor.toml");
    let store = SettingsStore::load(Some(file.clone())).unwrap();

    assert_eq!(Some(file.as_path()), store.file());
    assert_eq!(LogLevel::default(), store.current().log_level);
    assert_eq!(None, store.current().pid_file);
    assert!(!file.exists());
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("servitor.toml");
    std::fs::write(
        &file,
        "log_level = \"debug\"\nbus_scope = \"system\"\npid_file = \"/tmp/servitor.pid\"\n",
    )
    .unwrap();

    let settings = SettingsStore::load(Some(file)).unwrap().current();
    assert_eq!(LogLevel(Level::DEBUG), settings.log_level);
    assert_eq!(Some(BusScope::System), settings.bus_scope);
    assert_eq!(Some(PathBuf::from("/tmp/servitor.pid")), settings.pid_file);
}

#[test]
fn test_reload_is_shared_between_clones() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("servitor.toml");
    let store = SettingsStore::load(Some(file.clone())).unwrap();
    let observer = store.clone();

    std::fs::write(&file, "control_timeout_ms = 250\n").unwrap();
    assert_eq!(None, observer.current().control_timeout());

    let reloaded = store.reload().unwrap();
    assert_eq!(Some(Duration::from_millis(250)), reloaded.control_timeout());
    assert_eq!(Some(Duration::from_millis(250)), observer.current().control_timeout());
}

#[test]
fn test_failed_reload_keeps_previous_value() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("servitor.toml");
    std::fs::write(&file, "bus_scope = \"user\"\n").unwrap();
    let store = SettingsStore::load(Some(file.clone())).unwrap();

    std::fs::write(&file, "bus_scope = \"galaxy\"\n").unwrap();
    let err = store.reload().unwrap_err();
    assert_eq!(Some(file), err.path);
    assert_eq!(Some(BusScope::User), store.current().bus_scope);
}

#[test]
fn test_invalid_file_fails_load() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("servitor.toml");
    std::fs::write(&file, "control_timeout_ms = \"soon\"\n").unwrap();

    let err = SettingsStore::load(Some(file)).unwrap_err();
    assert!(err.to_string().starts_with("Error loading settings from"));
}

#[test]
fn test_fixed_store_ignores_reload() {
    let settings = ServiceSettings {
        control_timeout_ms: Some(10),
        ..Default::default()
    };
    let store = SettingsStore::fixed(settings.clone());
    assert_eq!(None, store.file());
    assert_eq!(settings, *store.reload().unwrap());
}

#[test]
fn test_template_lists_settings() {
    let template = SettingsStore::template();
    for key in ["log_level", "bus_scope", "control_timeout_ms", "pid_file"] {
        assert!(template.contains(key), "{key} missing from {template}");
    }
}
