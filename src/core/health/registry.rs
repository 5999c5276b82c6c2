//! Reporter registry.
//!
//! Builds, once per process, the ordered list of reporters available on this
//! host: a fixed core set followed by one reporter per discovered volume,
//! network adapter direction and configured service.

use std::collections::{BTreeMap, HashSet};

use super::reporter::{
    CounterSource, GaugeReporter, GaugeSource, RateReporter, Reporter, ServiceReporter,
    StatusSource,
};
use super::threshold::Thresholds;

pub const CPU_THRESHOLDS: Thresholds = Thresholds::rising(0.90, 0.95);
pub const MEMORY_THRESHOLDS: Thresholds = Thresholds::rising(0.85, 0.95);
pub const VOLUME_THRESHOLDS: Thresholds = Thresholds::rising(0.90, 0.95);
pub const RUNTIME_THRESHOLDS: Thresholds = Thresholds::rising(0.25, 0.50);

/// A fixed local storage volume
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume {
    pub mount_point: String,
}

/// Interface family used to build stable adapter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdapterFamily {
    Ethernet,
    Wireless,
    Tunnel,
    Other,
}

impl AdapterFamily {
    /// Guess the family from an interface name
    pub fn classify(interface: &str) -> Self {
        let name = interface.to_ascii_lowercase();
        if name.starts_with("eth") || name.starts_with("en") || name.contains("ethernet") {
            AdapterFamily::Ethernet
        } else if name.starts_with("wl") || name.contains("wi-fi") || name.contains("wireless") {
            AdapterFamily::Wireless
        } else if ["tun", "tap", "wg", "ppp", "utun"]
            .iter()
            .any(|prefix| name.starts_with(prefix))
        {
            AdapterFamily::Tunnel
        } else {
            AdapterFamily::Other
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            AdapterFamily::Ethernet => "eth",
            AdapterFamily::Wireless => "wlan",
            AdapterFamily::Tunnel => "tun",
            AdapterFamily::Other => "net",
        }
    }
}

/// Whether an interface name denotes a loopback device
pub fn is_loopback(interface: &str) -> bool {
    let name = interface.to_ascii_lowercase();
    if name.contains("loopback") {
        return true;
    }
    match name.strip_prefix("lo") {
        Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// A non-loopback network adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Adapter {
    /// OS interface name, used to read counters
    pub interface: String,
    pub family: AdapterFamily,
}

impl Adapter {
    pub fn new<S: Into<String>>(interface: S) -> Self {
        let interface = interface.into();
        let family = AdapterFamily::classify(&interface);
        Self { interface, family }
    }
}

/// Direction of adapter traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traffic {
    Sent,
    Received,
}

impl Traffic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Traffic::Sent => "sent",
            Traffic::Received => "received",
        }
    }
}

/// Everything discovered about the host at startup
#[derive(Debug, Clone, Default)]
pub struct HostInventory {
    pub logical_cpus: usize,
    pub volumes: Vec<Volume>,
    pub adapters: Vec<Adapter>,
    pub services: Vec<String>,
    pub include_runtime: bool,
}

/// Creates metric sources for the identities found in a [`HostInventory`]
pub trait SourceFactory {
    fn cpu(&self) -> GaugeSource;

    fn load(&self) -> GaugeSource;

    fn memory(&self) -> GaugeSource;

    fn volume(&self, volume: &Volume) -> GaugeSource;

    fn adapter(&self, adapter: &Adapter, traffic: Traffic) -> CounterSource;

    fn service(&self, name: &str) -> StatusSource;

    fn runtime(&self) -> GaugeSource;
}

/// Ordered, immutable set of reporters
pub struct ReporterRegistry {
    reporters: Vec<Box<dyn Reporter>>,
}

impl ReporterRegistry {
    pub fn build(inventory: &HostInventory, factory: &dyn SourceFactory) -> Self {
        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();

        reporters.push(Box::new(GaugeReporter::new(
            "cpu",
            CPU_THRESHOLDS,
            factory.cpu(),
        )));
        reporters.push(Box::new(GaugeReporter::new(
            "load",
            load_thresholds(inventory.logical_cpus),
            factory.load(),
        )));
        reporters.push(Box::new(GaugeReporter::new(
            "memory",
            MEMORY_THRESHOLDS,
            factory.memory(),
        )));

        let mut volumes = inventory.volumes.clone();
        volumes.sort();
        volumes.dedup();
        for volume in &volumes {
            reporters.push(Box::new(GaugeReporter::new(
                format!("disk {}", volume.mount_point),
                VOLUME_THRESHOLDS,
                factory.volume(volume),
            )));
        }

        for (label, adapter) in adapter_labels(&inventory.adapters) {
            for traffic in [Traffic::Sent, Traffic::Received] {
                reporters.push(Box::new(RateReporter::new(
                    format!("{} bytes {}", label, traffic.as_str()),
                    Thresholds::never(),
                    factory.adapter(adapter, traffic),
                )));
            }
        }

        let mut seen = HashSet::new();
        for service in &inventory.services {
            if !seen.insert(service.as_str()) {
                continue;
            }
            reporters.push(Box::new(ServiceReporter::new(
                format!("service {}", service),
                factory.service(service),
            )));
        }

        if inventory.include_runtime {
            reporters.push(Box::new(GaugeReporter::new(
                "agent cpu",
                RUNTIME_THRESHOLDS,
                factory.runtime(),
            )));
        }

        Self { reporters }
    }

    pub fn names(&self) -> Vec<&str> {
        self.reporters.iter().map(|r| r.name()).collect()
    }

    pub fn into_reporters(self) -> Vec<Box<dyn Reporter>> {
        self.reporters
    }
}

/// Queue length thresholds scale with the number of logical CPUs
fn load_thresholds(logical_cpus: usize) -> Thresholds {
    let cpus = logical_cpus.max(1) as f64;
    Thresholds::rising(cpus, cpus * 2.0)
}

/// Assign `<family><index>` labels, ordered by family and then interface name
fn adapter_labels(adapters: &[Adapter]) -> Vec<(String, &Adapter)> {
    let mut families: BTreeMap<AdapterFamily, Vec<&Adapter>> = BTreeMap::new();
    for adapter in adapters {
        if is_loopback(&adapter.interface) {
            continue;
        }
        families.entry(adapter.family).or_default().push(adapter);
    }

    let mut labels = Vec::new();
    for (family, mut members) in families {
        members.sort_by(|a, b| a.interface.cmp(&b.interface));
        members.dedup_by(|a, b| a.interface == b.interface);
        for (index, adapter) in members.into_iter().enumerate() {
            labels.push((format!("{}{}", family.prefix(), index), adapter));
        }
    }
    labels
}
