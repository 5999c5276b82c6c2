//! Metric evaluation engine.
//!
//! Turns a set of heterogeneous, stateful metric sources into a uniform
//! stream of classified events: reporters sample their sources, thresholds
//! classify the samples and the scheduler hands the results to a sink.

mod event;
pub mod rate;
pub mod registry;
mod reporter;
mod scheduler;
pub mod threshold;

pub use event::{ClassifiedEvent, EventSink};
pub use rate::{Delta, RateCounter, RateState};
pub use registry::{
    is_loopback, Adapter, AdapterFamily, HostInventory, ReporterRegistry, SourceFactory, Traffic,
    Volume,
};
pub use reporter::{
    CounterSource, GaugeReporter, GaugeSource, MetricSource, RateReporter, Reading, Reporter,
    Sample, ServiceReporter, ServiceStatus, StatusSource, Unavailable, SERVICE_THRESHOLDS,
};
pub use scheduler::{PollingScheduler, SchedulerConfig, TickReport};
pub use threshold::{classify, Direction, State, Thresholds};
