//! Event sinks.
//!
//! Transports for classified events. Both sinks absorb their own failures;
//! nothing they do can stop the polling loop.

mod log_sink;
mod tcp;

pub use log_sink::LogSink;
pub use tcp::{EventRecord, TcpJsonSink};
