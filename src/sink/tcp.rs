//! Newline-delimited JSON over TCP.

use std::io::{BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::core::health::{ClassifiedEvent, EventSink, State};
use crate::error::{AgentError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Wire representation of one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub host: String,
    pub service: String,
    pub state: State,
    pub description: String,
    pub metric: f64,
    pub ttl: f32,
    pub time: i64,
}

impl EventRecord {
    pub fn new(host: &str, event: ClassifiedEvent) -> Self {
        Self {
            host: host.to_string(),
            service: event.name,
            state: event.state,
            description: event.description,
            // JSON has no infinities or NaN
            metric: if event.value.is_finite() {
                event.value
            } else {
                0.0
            },
            ttl: event.ttl.as_secs_f32(),
            time: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Default)]
struct Connection {
    stream: Option<BufWriter<TcpStream>>,
    failing: bool,
}

/// Sends each event as one JSON line to `host:port`.
///
/// The connection is opened lazily and dropped on the first write error; the
/// next event reconnects. Failures are logged once per outage.
pub struct TcpJsonSink {
    endpoint: String,
    source_host: String,
    connection: Mutex<Connection>,
}

impl TcpJsonSink {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            source_host: sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string()),
            connection: Mutex::new(Connection::default()),
        }
    }

    /// Override the host name reported in every record
    pub fn with_source_host<S: Into<String>>(mut self, host: S) -> Self {
        self.source_host = host.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connect(&self) -> Result<BufWriter<TcpStream>> {
        let mut last_error = None;
        for addr in self.endpoint.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    return Ok(BufWriter::new(stream));
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(match last_error {
            Some(e) => AgentError::Io(e),
            None => AgentError::sink(format!("{} resolved to no addresses", self.endpoint)),
        })
    }

    fn send(&self, connection: &mut Connection, record: &EventRecord) -> Result<()> {
        if connection.stream.is_none() {
            connection.stream = Some(self.connect()?);
        }
        let Some(stream) = connection.stream.as_mut() else {
            return Err(AgentError::sink("connection missing"));
        };

        serde_json::to_writer(&mut *stream, record)?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }
}

impl EventSink for TcpJsonSink {
    fn emit(&self, event: ClassifiedEvent) {
        let record = EventRecord::new(&self.source_host, event);
        let mut connection = self.connection.lock();

        match self.send(&mut connection, &record) {
            Ok(()) => {
                if connection.failing {
                    info!("Connection to {} restored", self.endpoint);
                    connection.failing = false;
                }
            }
            Err(e) => {
                connection.stream = None;
                if !connection.failing {
                    warn!("Cannot deliver events to {}: {}", self.endpoint, e);
                    connection.failing = true;
                }
            }
        }
    }
}
