//! Command-line surface.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::AgentError;

/// Build the argument parser
pub fn cli() -> Command {
    Command::new("hostpulse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Samples host health metrics and forwards classified events to a monitoring backend")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("host")
                .help("Monitoring backend host (overrides the configuration)")
                .index(1),
        )
        .arg(
            Arg::new("port")
                .help("Monitoring backend port (overrides the configuration)")
                .value_parser(clap::value_parser!(u16).range(1..))
                .index(2),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (defaults to the user config directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Log events instead of sending them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .help("Write the effective configuration to the config file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single polling tick and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Report for errors that stem from bad configuration: the message followed
/// by the usage line. Other errors yield `None`.
pub fn config_error_report(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<AgentError>() {
        Some(config_error) if config_error.is_config() => Some(format!(
            "error: {}\n\n{}",
            config_error,
            cli().render_usage()
        )),
        _ => None,
    }
}
