use hostpulse::commands::run::{effective_config, write_config, RunOptions};
use hostpulse::AgentConfig;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "host": "metrics.internal",
            "port": 5556,
            "interval": 10,
            "ttl": 30,
            "includeRuntimeStats": true,
            "services": ["sshd", "cron"]
        }"#,
    )
    .unwrap();

    let config = AgentConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.endpoint(), "metrics.internal:5556");
    assert!(config.include_runtime_stats);
    assert_eq!(config.services, vec!["sshd", "cron"]);
    assert_eq!(config.scheduler_config().interval, Duration::from_secs(10));
    assert_eq!(config.scheduler_config().ttl, Duration::from_secs(30));
}

#[test]
fn test_config_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = AgentConfig::load(Some(temp_dir.path().join("missing.json").as_path())).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_config_invalid_json_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ host: nope").unwrap();

    let err = AgentConfig::load(Some(path.as_path())).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("config.json"));
}

#[test]
fn test_config_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = AgentConfig {
        host: "10.1.2.3".to_string(),
        services: vec!["nginx".to_string()],
        ..Default::default()
    };
    config.save(&path).unwrap();

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"includeRuntimeStats\""));
    assert_eq!(AgentConfig::load(Some(path.as_path())).unwrap(), config);
}

#[test]
fn test_cli_overrides_apply_on_top_of_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{ "host": "file-host", "port": 1234 }"#).unwrap();

    let host_only = RunOptions {
        config_path: Some(path.clone()),
        host: Some("cli-host".to_string()),
        ..Default::default()
    };
    assert_eq!(
        effective_config(&host_only).unwrap().endpoint(),
        "cli-host:1234"
    );

    let host_and_port = RunOptions {
        config_path: Some(path),
        host: Some("cli-host".to_string()),
        port: Some(9999),
        ..Default::default()
    };
    assert_eq!(
        effective_config(&host_and_port).unwrap().endpoint(),
        "cli-host:9999"
    );
}

#[test]
fn test_cli_empty_host_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{}").unwrap();

    let options = RunOptions {
        config_path: Some(path),
        host: Some(String::new()),
        ..Default::default()
    };
    assert!(effective_config(&options).unwrap_err().is_config());
}

#[test]
fn test_write_config_creates_missing_file_from_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let options = RunOptions {
        config_path: Some(path.clone()),
        host: Some("collector.lan".to_string()),
        write_config: true,
        ..Default::default()
    };
    assert!(effective_config(&options).is_err());

    let written = write_config(&options).unwrap();
    assert_eq!(written, path);

    let expected = AgentConfig {
        host: "collector.lan".to_string(),
        ..AgentConfig::default()
    };
    assert_eq!(AgentConfig::load_from(&path).unwrap(), expected);
}

#[test]
fn test_write_config_keeps_existing_file_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{ "host": "file-host", "services": ["sshd"] }"#).unwrap();

    let options = RunOptions {
        config_path: Some(path.clone()),
        port: Some(7000),
        write_config: true,
        ..Default::default()
    };
    write_config(&options).unwrap();

    let reloaded = AgentConfig::load_from(&path).unwrap();
    assert_eq!(reloaded.endpoint(), "file-host:7000");
    assert_eq!(reloaded.services, vec!["sshd"]);
}
