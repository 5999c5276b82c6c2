use anyhow::Result;
use std::process::ExitCode;

use hostpulse::commands::cli::{cli, config_error_report};
use hostpulse::commands::run::{self, RunOptions};

fn main() -> Result<ExitCode> {
    // Argument errors (bad port, extra positionals) print usage and exit non-zero here
    let matches = cli().get_matches();

    if matches.get_flag("version") {
        println!("hostpulse version {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    hostpulse::init_logging();

    match run::execute(RunOptions::from_matches(&matches)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match config_error_report(&e) {
            Some(report) => {
                eprintln!("{}", report);
                Ok(ExitCode::FAILURE)
            }
            None => Err(e),
        },
    }
}
