// Runtime teardown with a sensor stuck in a blocking read

use hostpulse::commands::run::drive;
use hostpulse::core::health::{
    ClassifiedEvent, EventSink, GaugeReporter, MetricSource, PollingScheduler, Reading,
    SchedulerConfig, Thresholds, Unavailable,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ClassifiedEvent) {}
}

struct Hung(Duration);

impl MetricSource for Hung {
    type Value = f64;

    fn read(&mut self) -> Result<Reading<f64>, Unavailable> {
        std::thread::sleep(self.0);
        Ok(Reading::new("hung", 0.1))
    }
}

#[test]
fn test_shutdown_does_not_wait_for_stuck_sensor() {
    let hung = GaugeReporter::new(
        "hung",
        Thresholds::rising(0.9, 0.95),
        Box::new(Hung(Duration::from_secs(4))),
    );
    let scheduler = PollingScheduler::from_reporters(
        vec![Box::new(hung)],
        Arc::new(NullSink),
        SchedulerConfig {
            interval: Duration::from_millis(10),
            ttl: Duration::from_secs(5),
            sample_timeout: Duration::from_millis(100),
        },
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let signaller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        let _ = shutdown_tx.send(());
    });

    let started = Instant::now();
    let ticks = drive(&scheduler, shutdown_rx, Duration::from_millis(100)).unwrap();
    let elapsed = started.elapsed();
    signaller.join().unwrap();

    assert!(ticks >= 1);
    assert!(elapsed < Duration::from_secs(2), "teardown took {:?}", elapsed);
}
