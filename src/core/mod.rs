// Core business logic module

pub mod config;
pub mod health;

// Re-export commonly used items
pub use config::AgentConfig;
pub use health::{ClassifiedEvent, EventSink, PollingScheduler, ReporterRegistry, State};
