//! Tests for configuration loading and override precedence.

use super::*;
use serial_test::serial;
use std::collections::HashMap;
use tempfile::TempDir;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = DevflowConfig::default();
    assert_eq!(config.logging.level, LogLevel::Info);
    assert!(config.logging.console);
    assert!(config.logging.durable);
    assert!(config.logging.log_dir.is_none());
    assert!(config.logging.session_id.is_none());
}

#[test]
fn test_partial_yaml_uses_defaults() {
    let yaml = r#"
logging:
  level: warn
  console: false
"#;
    let config: DevflowConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert!(!config.logging.console);
    assert!(config.logging.durable);
}

#[test]
fn test_empty_yaml_is_default() {
    let config: DevflowConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, DevflowConfig::default());
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "logging:\n  level: debug\n  log_dir: /var/log/devflow\n  session_id: ci-run\n",
    )
    .unwrap();

    let config = DevflowConfig::load(&path).unwrap();
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(
        config.logging.log_dir.as_deref(),
        Some(Path::new("/var/log/devflow"))
    );
    assert_eq!(config.logging.session_id.as_deref(), Some("ci-run"));
}

#[test]
fn test_load_rejects_bad_level() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "logging:\n  level: verbose\n").unwrap();

    let err = DevflowConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(DevflowConfig::load_or_default(Some(&missing)).is_err());
}

#[test]
fn test_env_overrides() {
    let mut config = DevflowConfig::default();
    config
        .apply_env_from(lookup_from(&[
            (ENV_LOG_LEVEL, "error"),
            (ENV_LOG_DIR, "/tmp/devflow-logs"),
        ]))
        .unwrap();
    assert_eq!(config.logging.level, LogLevel::Error);
    assert_eq!(
        config.logging.log_dir.as_deref(),
        Some(Path::new("/tmp/devflow-logs"))
    );
}

#[test]
fn test_empty_env_values_are_ignored() {
    let mut config = DevflowConfig::default();
    config
        .apply_env_from(lookup_from(&[(ENV_LOG_LEVEL, " "), (ENV_LOG_DIR, "")]))
        .unwrap();
    assert_eq!(config, DevflowConfig::default());
}

#[test]
fn test_invalid_env_level_is_error() {
    let mut config = DevflowConfig::default();
    let err = config
        .apply_env_from(lookup_from(&[(ENV_LOG_LEVEL, "loud")]))
        .unwrap_err();
    assert!(err.to_string().contains(ENV_LOG_LEVEL));
}

#[test]
fn test_cli_overrides_win_over_env_and_file() {
    let mut config: DevflowConfig =
        serde_yaml::from_str("logging:\n  level: debug\n  session_id: from-file\n").unwrap();
    config
        .apply_env_from(lookup_from(&[(ENV_LOG_LEVEL, "warn")]))
        .unwrap();
    config.apply_overrides(&LoggingOverrides {
        level: Some(LogLevel::Error),
        log_dir: None,
        no_console: true,
        no_durable: false,
        session_id: Some("from-cli".to_string()),
    });

    assert_eq!(config.logging.level, LogLevel::Error);
    assert!(!config.logging.console);
    assert!(config.logging.durable);
    assert_eq!(config.logging.session_id.as_deref(), Some("from-cli"));
}

#[test]
fn test_to_logger_options_uses_configured_dir() {
    let dir = TempDir::new().unwrap();
    let mut config = DevflowConfig::default();
    config.logging.log_dir = Some(dir.path().join("audit"));
    config.logging.level = LogLevel::Warn;

    let options = config.to_logger_options(dir.path()).unwrap();
    assert_eq!(options.log_dir, dir.path().join("audit"));
    assert_eq!(options.min_level, LogLevel::Warn);
    assert!(options.console);
    assert!(options.durable);
}

#[test]
fn test_to_logger_options_defaults_to_working_dir_logs() {
    let dir = TempDir::new().unwrap();
    let options = DevflowConfig::default()
        .to_logger_options(dir.path())
        .unwrap();
    assert!(options
        .log_dir
        .ends_with(crate::paths::working_dir_hash(dir.path())));
}

#[test]
#[serial]
fn test_apply_env_reads_process_environment() {
    std::env::set_var(ENV_LOG_LEVEL, "debug");
    std::env::remove_var(ENV_LOG_DIR);

    let mut config = DevflowConfig::default();
    let outcome = config.apply_env();

    std::env::remove_var(ENV_LOG_LEVEL);
    outcome.unwrap();
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.logging.log_dir.is_none());
}
