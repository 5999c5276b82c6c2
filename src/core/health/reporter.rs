//! Reporter abstraction.
//!
//! A reporter pairs a metric source with a stable name and a pair of
//! thresholds. Three variants exist: gauges forward the source value, rate
//! reporters turn a cumulative counter into a per-tick delta, and service
//! reporters map an availability status onto a fixed scale.

use humansize::{format_size, BINARY};
use thiserror::Error;

use super::rate::RateCounter;
use super::threshold::Thresholds;

/// A metric could not be read this tick.
///
/// This is an expected outcome (drive not ready, interface gone, counter
/// unreadable) and only means "skip this reporter for now".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("metric unavailable: {reason}")]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Raw reading from a metric source
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub description: String,
    pub value: T,
}

impl<T> Reading<T> {
    pub fn new<S: Into<String>>(description: S, value: T) -> Self {
        Self {
            description: description.into(),
            value,
        }
    }
}

/// Synchronous read of one raw metric.
///
/// Implementations live in the platform layer. A read must not mutate host
/// state and must be safe to call once per tick.
pub trait MetricSource: Send {
    type Value;

    fn read(&mut self) -> Result<Reading<Self::Value>, Unavailable>;
}

/// Normalized sample produced by a reporter
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub description: String,
    pub value: f64,
}

/// A named metric producer with two alert thresholds
pub trait Reporter: Send {
    fn name(&self) -> &str;

    fn thresholds(&self) -> Thresholds;

    fn sample(&mut self) -> Result<Sample, Unavailable>;
}

pub type GaugeSource = Box<dyn MetricSource<Value = f64>>;
pub type CounterSource = Box<dyn MetricSource<Value = u64>>;
pub type StatusSource = Box<dyn MetricSource<Value = ServiceStatus>>;

/// Reporter whose source already yields a normalized value
pub struct GaugeReporter {
    name: String,
    thresholds: Thresholds,
    source: GaugeSource,
}

impl GaugeReporter {
    pub fn new<S: Into<String>>(name: S, thresholds: Thresholds, source: GaugeSource) -> Self {
        Self {
            name: name.into(),
            thresholds,
            source,
        }
    }
}

impl Reporter for GaugeReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn sample(&mut self) -> Result<Sample, Unavailable> {
        let reading = self.source.read()?;
        Ok(Sample {
            description: reading.description,
            value: reading.value,
        })
    }
}

/// Reporter over a cumulative counter.
///
/// The value is the raw counter increase over the last interval. The first
/// successful read only seeds the counter and is reported as unavailable.
pub struct RateReporter {
    name: String,
    thresholds: Thresholds,
    source: CounterSource,
    counter: RateCounter,
}

impl RateReporter {
    pub fn new<S: Into<String>>(name: S, thresholds: Thresholds, source: CounterSource) -> Self {
        Self {
            name: name.into(),
            thresholds,
            source,
            counter: RateCounter::new(),
        }
    }
}

impl Reporter for RateReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn sample(&mut self) -> Result<Sample, Unavailable> {
        // A failed read leaves the counter untouched
        let reading = self.source.read()?;
        let delta = self
            .counter
            .observe(reading.value)
            .ok_or_else(|| Unavailable::new("counter baseline recorded"))?;

        let description = if delta.reset {
            format!("{} (counter reset)", reading.description)
        } else {
            format!(
                "{}: {} in {:.1}s ({}/s)",
                reading.description,
                format_size(delta.value, BINARY),
                delta.elapsed.as_secs_f64(),
                format_size(delta.per_second() as u64, BINARY),
            )
        };

        Ok(Sample {
            description,
            value: delta.value as f64,
        })
    }
}

/// Availability of an external service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Paused,
    Transitioning,
    Unknown,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 5] = [
        ServiceStatus::Running,
        ServiceStatus::Stopped,
        ServiceStatus::Paused,
        ServiceStatus::Transitioning,
        ServiceStatus::Unknown,
    ];

    pub fn value(&self) -> f64 {
        match self {
            ServiceStatus::Running => 1.0,
            ServiceStatus::Stopped => 0.0,
            ServiceStatus::Paused => 0.5,
            ServiceStatus::Transitioning => 0.5,
            ServiceStatus::Unknown => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Paused => "paused",
            ServiceStatus::Transitioning => "transitioning",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

/// Thresholds of every availability reporter
pub const SERVICE_THRESHOLDS: Thresholds = Thresholds::falling(0.5, 0.0);

/// Reporter over a service's availability status
pub struct ServiceReporter {
    name: String,
    source: StatusSource,
}

impl ServiceReporter {
    pub fn new<S: Into<String>>(name: S, source: StatusSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

impl Reporter for ServiceReporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn thresholds(&self) -> Thresholds {
        SERVICE_THRESHOLDS
    }

    fn sample(&mut self) -> Result<Sample, Unavailable> {
        let reading = self.source.read()?;
        Ok(Sample {
            description: reading.description,
            value: reading.value.value(),
        })
    }
}
