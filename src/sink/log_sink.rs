use crate::core::health::{ClassifiedEvent, EventSink};

/// Writes events to the log instead of a backend (dry-run mode)
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: ClassifiedEvent) {
        log::info!(
            "{} [{}] {} ({}) ttl={:?}",
            event.name,
            event.state,
            event.value,
            event.description,
            event.ttl
        );
    }
}
