//! Tests for config functionality.

use crate::config::types::default_store_dir;
use crate::config::{ENV_OLDEST_TOUCH_MS, ENV_STORE_DIR, MutexConfig, NativeLockKind};
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = MutexConfig::default();

    assert_eq!(config.oldest_touch_ms, 2000);
    assert_eq!(config.acquire_interval_ms, 1);
    assert_eq!(config.touch_interval_ms, 5);
    assert_eq!(config.native_poll_interval_ms, 10);
    assert_eq!(config.store_dir, default_store_dir());
    assert_eq!(config.native_lock, NativeLockKind::File);
    assert!(config.enable_persistent_store);
    assert!(config.enable_session_store);
    assert!(config.record_owner);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = MutexConfig::from_yaml("").unwrap();
    assert_eq!(config, MutexConfig::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
oldest_touch_ms: 500
native_lock: local
"#;
    let config = MutexConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.oldest_touch_ms, 500);
    assert_eq!(config.native_lock, NativeLockKind::Local);

    // Unspecified values should use defaults
    assert_eq!(config.touch_interval_ms, 5);
    assert!(config.enable_session_store);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
oldest_touch_ms: 3000
acquire_interval_ms: 2
touch_interval_ms: 20
native_poll_interval_ms: 15
store_dir: /var/tmp/locks
native_lock: disabled
enable_persistent_store: false
enable_session_store: true
record_owner: false
"#;
    let config = MutexConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.oldest_touch_ms, 3000);
    assert_eq!(config.acquire_interval_ms, 2);
    assert_eq!(config.touch_interval_ms, 20);
    assert_eq!(config.native_poll_interval_ms, 15);
    assert_eq!(config.store_dir, PathBuf::from("/var/tmp/locks"));
    assert_eq!(config.native_lock, NativeLockKind::Disabled);
    assert!(!config.enable_persistent_store);
    assert!(config.enable_session_store);
    assert!(!config.record_owner);
}

#[test]
fn test_parse_yaml_with_unknown_fields() {
    let yaml = r#"
touch_interval_ms: 7
future_option: true
"#;
    let config = MutexConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.touch_interval_ms, 7);
}

#[test]
fn test_parse_invalid_native_lock_kind() {
    let result = MutexConfig::from_yaml("native_lock: kernel\n");
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("failed to parse config YAML")
    );
}

#[test]
fn test_native_lock_kind_from_str() {
    assert_eq!(NativeLockKind::from_str("file"), Some(NativeLockKind::File));
    assert_eq!(NativeLockKind::from_str("local"), Some(NativeLockKind::Local));
    assert_eq!(
        NativeLockKind::from_str("disabled"),
        Some(NativeLockKind::Disabled)
    );
    assert_eq!(NativeLockKind::from_str("File"), None);
}

#[test]
fn test_validate_zero_intervals() {
    for field in [
        "oldest_touch_ms",
        "acquire_interval_ms",
        "touch_interval_ms",
        "native_poll_interval_ms",
    ] {
        let yaml = format!("{}: 0\n", field);
        let err = MutexConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains(field), "{}", err);
        assert!(err.to_string().contains("greater than 0"));
    }
}

#[test]
fn test_validate_acquire_slower_than_touch() {
    let yaml = r#"
acquire_interval_ms: 10
touch_interval_ms: 5
"#;
    let err = MutexConfig::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("must not exceed touch_interval_ms"));
}

#[test]
fn test_validate_touch_not_below_oldest() {
    let yaml = r#"
touch_interval_ms: 2000
oldest_touch_ms: 2000
"#;
    let err = MutexConfig::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("must be less than oldest_touch_ms"));
}

#[test]
fn test_timing_conversion() {
    let config = MutexConfig {
        oldest_touch_ms: 1500,
        touch_interval_ms: 8,
        ..MutexConfig::default()
    };
    let timing = config.timing();

    assert_eq!(timing.oldest_touch, Duration::from_millis(1500));
    assert_eq!(timing.oldest_touch_ms(), 1500);
    assert_eq!(timing.acquire_interval, Duration::from_millis(1));
    assert_eq!(timing.touch_interval, Duration::from_millis(8));
    assert_eq!(timing.native_poll_interval, Duration::from_millis(10));
}

#[test]
fn test_default_timing_matches_lease_defaults() {
    assert_eq!(MutexConfig::default().timing(), crate::lease::Timing::default());
}

#[test]
fn test_store_subdirectories() {
    let config = MutexConfig {
        store_dir: PathBuf::from("/tmp/kv"),
        ..MutexConfig::default()
    };
    assert_eq!(config.records_dir(), PathBuf::from("/tmp/kv/records"));
    assert_eq!(config.native_dir(), PathBuf::from("/tmp/kv/native"));
}

#[test]
fn test_to_yaml() {
    let config = MutexConfig {
        native_lock: NativeLockKind::Local,
        ..MutexConfig::default()
    };
    let yaml = config.to_yaml().unwrap();

    assert!(yaml.contains("native_lock: local"));
    let parsed = MutexConfig::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_config_load_from_file() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "oldest_touch_ms: 900").unwrap();
    writeln!(file, "record_owner: false").unwrap();

    let config = MutexConfig::load(file.path()).unwrap();
    assert_eq!(config.oldest_touch_ms, 900);
    assert!(!config.record_owner);
}

#[test]
fn test_config_load_missing_file() {
    let result = MutexConfig::load("/nonexistent/path/kvmutex.yaml");
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
    assert_eq!(err.exit_code(), crate::exit_codes::USER_ERROR);
}

#[test]
#[serial]
fn test_env_overrides_applied() {
    // SAFETY: serialized with every other test touching these variables.
    unsafe {
        std::env::set_var(ENV_STORE_DIR, "/tmp/kvmutex-env");
        std::env::set_var(ENV_OLDEST_TOUCH_MS, "750");
    }

    let mut config = MutexConfig::default();
    let result = config.apply_env_overrides();

    unsafe {
        std::env::remove_var(ENV_STORE_DIR);
        std::env::remove_var(ENV_OLDEST_TOUCH_MS);
    }

    result.unwrap();
    assert_eq!(config.store_dir, PathBuf::from("/tmp/kvmutex-env"));
    assert_eq!(config.oldest_touch_ms, 750);
}

#[test]
#[serial]
fn test_env_override_rejects_garbage() {
    unsafe {
        std::env::set_var(ENV_OLDEST_TOUCH_MS, "soon");
    }

    let mut config = MutexConfig::default();
    let result = config.apply_env_overrides();

    unsafe {
        std::env::remove_var(ENV_OLDEST_TOUCH_MS);
    }

    let err = result.unwrap_err();
    assert!(err.to_string().contains(ENV_OLDEST_TOUCH_MS));
}

#[test]
#[serial]
fn test_env_override_is_validated() {
    unsafe {
        std::env::set_var(ENV_OLDEST_TOUCH_MS, "3");
    }

    let mut config = MutexConfig::default();
    let result = config.apply_env_overrides();

    unsafe {
        std::env::remove_var(ENV_OLDEST_TOUCH_MS);
    }

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_no_env_leaves_config_untouched() {
    unsafe {
        std::env::remove_var(ENV_STORE_DIR);
        std::env::remove_var(ENV_OLDEST_TOUCH_MS);
    }

    let mut config = MutexConfig::default();
    config.apply_env_overrides().unwrap();
    assert_eq!(config, MutexConfig::default());
}
