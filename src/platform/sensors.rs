//! Host sensors backed by `sysinfo`.
//!
//! One [`SysinfoSources`] owns the shared `System`, `Disks` and `Networks`
//! handles; every metric source it hands out locks the handle it needs,
//! refreshes only that subsystem and reads a single value.

use std::path::Path;
use std::sync::Arc;

use humansize::{format_size, BINARY};
use parking_lot::Mutex;
use sysinfo::{Disks, Networks, Pid, ProcessesToUpdate, System};

use crate::core::health::{
    is_loopback, Adapter, CounterSource, GaugeSource, HostInventory, MetricSource, Reading,
    SourceFactory, StatusSource, Traffic, Unavailable, Volume,
};
use crate::core::AgentConfig;

use super::services::ServiceQuery;

/// Filesystems that never represent fixed local storage
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "tmpfs", "devtmpfs", "overlay", "squashfs", "proc", "sysfs", "cgroup", "cgroup2", "devfs",
    "autofs", "ramfs",
];

/// Whether a mounted disk counts as a fixed local volume
pub fn is_fixed_volume(file_system: &str, removable: bool, total_bytes: u64) -> bool {
    !removable
        && total_bytes > 0
        && !PSEUDO_FILESYSTEMS
            .iter()
            .any(|fs| fs.eq_ignore_ascii_case(file_system))
}

/// Fraction of `total` in use, `None` for an empty total
pub fn used_fraction(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64)
}

/// Factory for sources reading the local host through `sysinfo`
#[derive(Clone)]
pub struct SysinfoSources {
    system: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
}

impl SysinfoSources {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();

        Self {
            system: Arc::new(Mutex::new(system)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }

    /// Enumerate volumes and adapters once, combined with the configured services
    pub fn discover(&self, config: &AgentConfig) -> HostInventory {
        let logical_cpus = self.system.lock().cpus().len();

        let volumes = self
            .disks
            .lock()
            .iter()
            .filter(|disk| {
                is_fixed_volume(
                    &disk.file_system().to_string_lossy(),
                    disk.is_removable(),
                    disk.total_space(),
                )
            })
            .map(|disk| Volume {
                mount_point: disk.mount_point().to_string_lossy().to_string(),
            })
            .collect();

        let adapters = self
            .networks
            .lock()
            .keys()
            .filter(|name| !is_loopback(name))
            .map(|name| Adapter::new(name.as_str()))
            .collect();

        HostInventory {
            logical_cpus,
            volumes,
            adapters,
            services: config.services.clone(),
            include_runtime: config.include_runtime_stats,
        }
    }
}

impl Default for SysinfoSources {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFactory for SysinfoSources {
    fn cpu(&self) -> GaugeSource {
        Box::new(CpuLoad {
            system: Arc::clone(&self.system),
        })
    }

    fn load(&self) -> GaugeSource {
        Box::new(QueueLength {
            system: Arc::clone(&self.system),
        })
    }

    fn memory(&self) -> GaugeSource {
        Box::new(MemoryLoad {
            system: Arc::clone(&self.system),
        })
    }

    fn volume(&self, volume: &Volume) -> GaugeSource {
        Box::new(VolumeUsage {
            disks: Arc::clone(&self.disks),
            mount_point: volume.mount_point.clone(),
        })
    }

    fn adapter(&self, adapter: &Adapter, traffic: Traffic) -> CounterSource {
        Box::new(AdapterCounter {
            networks: Arc::clone(&self.networks),
            interface: adapter.interface.clone(),
            traffic,
        })
    }

    fn service(&self, name: &str) -> StatusSource {
        Box::new(ServiceQuery::new(name))
    }

    fn runtime(&self) -> GaugeSource {
        Box::new(AgentCpu {
            system: Arc::clone(&self.system),
            pid: sysinfo::get_current_pid().ok(),
        })
    }
}

struct CpuLoad {
    system: Arc<Mutex<System>>,
}

impl MetricSource for CpuLoad {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        let cores = system.cpus().len();
        if cores == 0 {
            return Err(Unavailable::new("no CPUs reported"));
        }

        let percent = system.global_cpu_usage() as f64;
        Ok(Reading::new(
            format!("{:.1}% CPU across {} cores", percent, cores),
            percent / 100.0,
        ))
    }
}

/// 1-minute load average, the closest portable analogue of a processor queue length
struct QueueLength {
    system: Arc<Mutex<System>>,
}

impl MetricSource for QueueLength {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        let cores = self.system.lock().cpus().len();
        let load = System::load_average();
        if !load.one.is_finite() {
            return Err(Unavailable::new("load average not reported"));
        }

        Ok(Reading::new(
            format!(
                "load average {:.2} {:.2} {:.2} ({} logical CPUs)",
                load.one, load.five, load.fifteen, cores
            ),
            load.one,
        ))
    }
}

struct MemoryLoad {
    system: Arc<Mutex<System>>,
}

impl MetricSource for MemoryLoad {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        let mut system = self.system.lock();
        system.refresh_memory();
        let total = system.total_memory();
        let used = system.used_memory();
        let fraction =
            used_fraction(used, total).ok_or_else(|| Unavailable::new("memory size unknown"))?;

        Ok(Reading::new(
            format!(
                "{} of {} memory in use",
                format_size(used, BINARY),
                format_size(total, BINARY)
            ),
            fraction,
        ))
    }
}

struct VolumeUsage {
    disks: Arc<Mutex<Disks>>,
    mount_point: String,
}

impl MetricSource for VolumeUsage {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        let disk = disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new(&self.mount_point))
            .ok_or_else(|| Unavailable::new(format!("{} is not mounted", self.mount_point)))?;

        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        let fraction = used_fraction(used, total)
            .ok_or_else(|| Unavailable::new(format!("{} is not ready", self.mount_point)))?;

        Ok(Reading::new(
            format!(
                "{}: {} of {} used",
                self.mount_point,
                format_size(used, BINARY),
                format_size(total, BINARY)
            ),
            fraction,
        ))
    }
}

struct AdapterCounter {
    networks: Arc<Mutex<Networks>>,
    interface: String,
    traffic: Traffic,
}

impl MetricSource for AdapterCounter {
    type Value = u64;

    fn read(&mut self) -> Result<Reading<u64>, Unavailable> {
        let mut networks = self.networks.lock();
        networks.refresh(true);

        let data = networks
            .get(&self.interface)
            .ok_or_else(|| Unavailable::new(format!("{} is down", self.interface)))?;

        let total = match self.traffic {
            Traffic::Sent => data.total_transmitted(),
            Traffic::Received => data.total_received(),
        };

        Ok(Reading::new(
            format!("{} {}", self.interface, self.traffic.as_str()),
            total,
        ))
    }
}

/// Share of total host CPU consumed by this agent
struct AgentCpu {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
}

impl MetricSource for AgentCpu {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        let pid = self
            .pid
            .ok_or_else(|| Unavailable::new("own process id unknown"))?;

        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let cores = system.cpus().len().max(1);
        let process = system
            .process(pid)
            .ok_or_else(|| Unavailable::new("own process not listed"))?;

        let share = process.cpu_usage() as f64 / 100.0 / cores as f64;
        Ok(Reading::new(
            format!(
                "agent at {:.2}% of host CPU, {} resident",
                share * 100.0,
                format_size(process.memory(), BINARY)
            ),
            share,
        ))
    }
}
