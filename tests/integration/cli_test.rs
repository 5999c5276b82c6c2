// Command-line parsing and the configuration error report

use clap::error::ErrorKind;
use hostpulse::commands::cli::{cli, config_error_report};
use hostpulse::commands::run::RunOptions;
use hostpulse::AgentError;

fn parse(args: &[&str]) -> Result<RunOptions, clap::Error> {
    let mut argv = vec!["hostpulse"];
    argv.extend_from_slice(args);
    cli()
        .try_get_matches_from(argv)
        .map(|matches| RunOptions::from_matches(&matches))
}

#[test]
fn test_no_positionals_keeps_configured_endpoint() {
    let options = parse(&[]).unwrap();
    assert_eq!(options, RunOptions::default());
}

#[test]
fn test_host_positional_only() {
    let options = parse(&["collector.lan"]).unwrap();
    assert_eq!(options.host.as_deref(), Some("collector.lan"));
    assert_eq!(options.port, None);
}

#[test]
fn test_host_and_port_positionals() {
    let options = parse(&["collector.lan", "5556", "--dry-run", "--once"]).unwrap();
    assert_eq!(options.host.as_deref(), Some("collector.lan"));
    assert_eq!(options.port, Some(5556));
    assert!(options.dry_run);
    assert!(options.once);
    assert!(!options.write_config);
}

#[test]
fn test_config_flag() {
    let options = parse(&["-c", "/tmp/agent.json", "--write-config"]).unwrap();
    assert_eq!(
        options.config_path.as_deref(),
        Some(std::path::Path::new("/tmp/agent.json"))
    );
    assert!(options.write_config);
}

#[test]
fn test_third_positional_is_usage_error() {
    let err = parse(&["collector.lan", "5556", "extra"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    assert_eq!(err.exit_code(), 2);
    assert!(err.render().to_string().contains("Usage"));
}

#[test]
fn test_non_numeric_port_is_rejected() {
    let err = parse(&["collector.lan", "abc"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_zero_port_is_rejected() {
    let err = parse(&["collector.lan", "0"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

#[test]
fn test_version_flag() {
    let matches = cli().try_get_matches_from(["hostpulse", "-v"]).unwrap();
    assert!(matches.get_flag("version"));
}

#[test]
fn test_config_error_report_includes_usage() {
    let err = anyhow::Error::from(AgentError::config("host must not be empty"));
    let report = config_error_report(&err).unwrap();
    assert!(report.starts_with("error: "));
    assert!(report.contains("host must not be empty"));
    assert!(report.contains("Usage"));
}

#[test]
fn test_other_errors_have_no_report() {
    let err = anyhow::Error::from(AgentError::sink("connection refused"));
    assert!(config_error_report(&err).is_none());
}
