use std::io;
use thiserror::Error;

/// Error type for the hostpulse agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(String),
}

/// Result type alias for the hostpulse agent
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AgentError::Config(msg.into())
    }

    /// Create a sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        AgentError::Sink(msg.into())
    }

    /// Whether this error came from configuration and should end the process with a usage hint
    pub fn is_config(&self) -> bool {
        matches!(self, AgentError::Config(_))
    }
}
