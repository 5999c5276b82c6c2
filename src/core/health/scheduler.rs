//! Polling scheduler.
//!
//! Drives the sample → classify → emit cycle at a fixed interval until a
//! shutdown signal arrives. Reporters are sampled one after another, in
//! registry order; each sample runs on the blocking pool under a timeout so
//! a stuck sensor only costs its own slot.
//!
//! A sample that outlives its timeout still finishes in the background and
//! its result is dropped. For rate reporters the late reading has already
//! become the counter baseline, so the traffic of that interval is never
//! reported; the next delta starts from the late reading.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::event::{ClassifiedEvent, EventSink};
use super::registry::ReporterRegistry;
use super::reporter::{Reporter, Sample, Unavailable};
use super::threshold::Thresholds;

/// Timing parameters of the polling loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Sleep between the end of one tick and the start of the next
    pub interval: Duration,
    /// Time-to-live attached to every emitted event
    pub ttl: Duration,
    /// Upper bound on a single reporter's sample
    pub sample_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            ttl: Duration::from_secs(5),
            sample_timeout: Duration::from_secs(2),
        }
    }
}

/// Outcome of one pass over all reporters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub emitted: usize,
    pub skipped: usize,
}

struct Slot {
    name: String,
    thresholds: Thresholds,
    reporter: Arc<Mutex<Box<dyn Reporter>>>,
}

pub struct PollingScheduler {
    slots: Vec<Slot>,
    sink: Arc<dyn EventSink>,
    config: SchedulerConfig,
}

impl PollingScheduler {
    pub fn new(
        registry: ReporterRegistry,
        sink: Arc<dyn EventSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self::from_reporters(registry.into_reporters(), sink, config)
    }

    pub fn from_reporters(
        reporters: Vec<Box<dyn Reporter>>,
        sink: Arc<dyn EventSink>,
        config: SchedulerConfig,
    ) -> Self {
        let slots = reporters
            .into_iter()
            .map(|reporter| Slot {
                name: reporter.name().to_string(),
                thresholds: reporter.thresholds(),
                reporter: Arc::new(Mutex::new(reporter)),
            })
            .collect();

        Self {
            slots,
            sink,
            config,
        }
    }

    pub fn reporter_count(&self) -> usize {
        self.slots.len()
    }

    /// Sample every reporter once and emit an event for each successful sample.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        for slot in &self.slots {
            match sample_slot(slot, self.config.sample_timeout).await {
                Ok(sample) => {
                    let event = ClassifiedEvent {
                        name: slot.name.clone(),
                        state: slot.thresholds.classify(sample.value),
                        description: sample.description,
                        value: sample.value,
                        ttl: self.config.ttl,
                    };
                    trace!("{} = {} ({})", event.name, event.value, event.state);
                    self.deliver(event);
                    report.emitted += 1;
                }
                Err(unavailable) => {
                    debug!("Skipping {}: {}", slot.name, unavailable.reason);
                    report.skipped += 1;
                }
            }
        }

        report
    }

    /// Run ticks until `shutdown` fires (or its sender is dropped).
    ///
    /// Returns the number of completed ticks.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            "Polling {} reporters every {:?}",
            self.slots.len(),
            self.config.interval
        );

        let mut ticks = 0u64;
        loop {
            if shutdown_requested(&mut shutdown) {
                break;
            }

            let report = self.tick().await;
            ticks += 1;
            debug!(
                "Tick {} done: {} emitted, {} skipped",
                ticks, report.emitted, report.skipped
            );

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        info!("Polling stopped after {} ticks", ticks);
        ticks
    }

    fn deliver(&self, event: ClassifiedEvent) {
        let name = event.name.clone();
        if catch_unwind(AssertUnwindSafe(|| self.sink.emit(event))).is_err() {
            error!("Event sink panicked while emitting {}", name);
        }
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Err(TryRecvError::Empty) => false,
        Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => true,
    }
}

async fn sample_slot(slot: &Slot, timeout: Duration) -> Result<Sample, Unavailable> {
    let reporter = Arc::clone(&slot.reporter);
    // A reporter still locked by an earlier, timed-out sample is skipped
    // rather than sampled twice.
    let task = tokio::task::spawn_blocking(move || match reporter.try_lock() {
        Some(mut guard) => guard.sample(),
        None => Err(Unavailable::new("previous sample still in progress")),
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            error!("Sampling {} failed: {}", slot.name, join_error);
            Err(Unavailable::new("sampler panicked"))
        }
        Err(_) => {
            warn!("Sampling {} exceeded {:?}", slot.name, timeout);
            Err(Unavailable::new("sample timed out"))
        }
    }
}
