//! Agent command handler.
//!
//! Loads configuration, discovers the host's reporters and drives the
//! polling scheduler until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;
use tokio::runtime::Runtime;
use tokio::sync::broadcast;

use crate::core::health::{EventSink, PollingScheduler, ReporterRegistry};
use crate::core::AgentConfig;
use crate::platform::SysinfoSources;
use crate::sink::{LogSink, TcpJsonSink};

/// Options collected from the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dry_run: bool,
    pub write_config: bool,
    pub once: bool,
}

impl RunOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches.get_one::<PathBuf>("config").cloned(),
            host: matches.get_one::<String>("host").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            dry_run: matches.get_flag("dry-run"),
            write_config: matches.get_flag("write-config"),
            once: matches.get_flag("once"),
        }
    }
}

/// Resolve the effective configuration: file (or defaults) plus CLI overrides
pub fn effective_config(options: &RunOptions) -> crate::Result<AgentConfig> {
    let mut config = AgentConfig::load(options.config_path.as_deref())?;
    config.apply_overrides(options.host.clone(), options.port);
    config.validate()?;
    Ok(config)
}

/// Write the effective configuration to the resolved config file.
///
/// A missing file is not an error here: defaults plus the CLI overrides are
/// written in its place.
pub fn write_config(options: &RunOptions) -> Result<PathBuf> {
    let path = AgentConfig::resolve_path(options.config_path.as_deref())?;
    let mut config = if path.exists() {
        AgentConfig::load_from(&path)?
    } else {
        AgentConfig::default()
    };
    config.apply_overrides(options.host.clone(), options.port);
    config.validate()?;
    config
        .save(&path)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(path)
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .thread_name("hostpulse-worker")
        .build()
        .context("Failed to start async runtime")
}

/// Run the scheduler until `shutdown` fires, then tear the runtime down.
///
/// Samples still blocked in a sensor get at most `grace` before the runtime
/// is abandoned. Returns the number of completed ticks.
pub fn drive(
    scheduler: &PollingScheduler,
    shutdown: broadcast::Receiver<()>,
    grace: Duration,
) -> Result<u64> {
    let runtime = runtime()?;
    let ticks = runtime.block_on(scheduler.run(shutdown));
    runtime.shutdown_timeout(grace);
    Ok(ticks)
}

/// Execute the agent
pub fn execute(options: RunOptions) -> Result<()> {
    if options.write_config {
        let path = write_config(&options)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let config = effective_config(&options)?;

    let sources = SysinfoSources::new();
    let inventory = sources.discover(&config);
    let registry = ReporterRegistry::build(&inventory, &sources);
    let names = registry.names().join(", ");

    let sink: Arc<dyn EventSink> = if options.dry_run {
        info!("Dry run: events are logged, not sent");
        Arc::new(LogSink)
    } else {
        let tcp = TcpJsonSink::new(config.endpoint());
        info!("Sending events to {}", tcp.endpoint());
        Arc::new(tcp)
    };

    let scheduler_config = config.scheduler_config();
    let scheduler = PollingScheduler::new(registry, sink, scheduler_config);
    info!("{} reporters: {}", scheduler.reporter_count(), names);

    if options.once {
        let runtime = runtime()?;
        let report = runtime.block_on(async {
            // CPU usage needs two refreshes to be meaningful
            tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
            scheduler.tick().await
        });
        runtime.shutdown_timeout(scheduler_config.sample_timeout);
        info!(
            "Single tick: {} emitted, {} skipped",
            report.emitted, report.skipped
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        let _ = shutdown_tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    drive(&scheduler, shutdown_rx, scheduler_config.sample_timeout)?;
    Ok(())
}
