use std::time::Duration;

use super::threshold::State;

/// A classified sample, ready for transmission
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub name: String,
    pub state: State,
    pub description: String,
    pub value: f64,
    pub ttl: Duration,
}

/// Receiver of classified events.
///
/// Emission is fire-and-forget: transport failures are handled (and logged)
/// inside the sink and never reach the scheduler.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClassifiedEvent);
}
