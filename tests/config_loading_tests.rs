//! Configuration loading through the public API

use std::time::Duration;

use oracle_phone::OraclePhoneConfig;
use tempfile::TempDir;

#[test]
fn test_explicit_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gallery.toml");
    std::fs::write(
        &path,
        r#"
[timing]
ring_timeout_ms = 12000

[cooldown]
window_secs = 45

[call]
target = "**7"
"#,
    )
    .unwrap();

    let config = OraclePhoneConfig::load(Some(&path)).unwrap();

    assert_eq!(config.timing.ring_timeout(), Duration::from_secs(12));
    assert_eq!(config.cooldown.window(), Duration::from_secs(45));
    assert_eq!(config.call.target, "**7");
    // untouched sections keep their defaults
    assert_eq!(config.gpio.hook_pin, 23);
    assert_eq!(config.timing.suspense_min_ms, 3_000);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");
    assert!(OraclePhoneConfig::load(Some(&path)).is_err());
}

#[test]
fn test_invalid_file_is_rejected_by_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[timing]
suspense_min_ms = 9000
suspense_max_ms = 1000
"#,
    )
    .unwrap();

    let err = OraclePhoneConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("suspense"));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.toml");
    let mut config = OraclePhoneConfig::default();
    config.dialogue.play_all_device_stories = false;
    config.audio.device = Some("plughw:1,0".to_string());

    config.save_to_file(&path).unwrap();
    let loaded = OraclePhoneConfig::load(Some(&path)).unwrap();

    assert!(!loaded.dialogue.play_all_device_stories);
    assert_eq!(loaded.audio.device.as_deref(), Some("plughw:1,0"));
    assert_eq!(loaded.dialogue.points_of_interest.len(), 7);
}
