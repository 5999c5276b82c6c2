use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::health::SchedulerConfig;
use crate::error::{AgentError, Result};

/// Environment variable naming an alternative configuration file
pub const CONFIG_ENV: &str = "HOSTPULSE_CONFIG";

/// Agent configuration, stored as JSON.
///
/// Every key is optional; omitted keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AgentConfig {
    /// Monitoring backend host
    pub host: String,
    /// Monitoring backend port
    pub port: u16,
    /// Seconds between polling ticks
    pub interval: f64,
    /// Seconds an emitted event stays valid
    pub ttl: f64,
    /// Add a reporter for the agent's own resource usage
    pub include_runtime_stats: bool,
    /// Services whose status is reported
    pub services: Vec<String>,
    /// Seconds a single sample may take before it is skipped
    pub sample_timeout: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5555,
            interval: 1.0,
            ttl: 5.0,
            include_runtime_stats: false,
            services: Vec::new(),
            sample_timeout: 2.0,
        }
    }
}

impl AgentConfig {
    /// Load the configuration.
    ///
    /// An explicit path (or `HOSTPULSE_CONFIG`) must exist. The default
    /// location may be absent, in which case defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            AgentError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_json(&data)
            .map_err(|e| AgentError::config(format!("{:?}: {}", path, config_message(&e))))
    }

    /// Parse and validate a JSON document. An empty document yields defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(data).map_err(|e| AgentError::config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AgentError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(AgentError::config("port must be between 1 and 65535"));
        }
        for (key, value) in [
            ("interval", self.interval),
            ("ttl", self.ttl),
            ("sampleTimeout", self.sample_timeout),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AgentError::config(format!(
                    "{} must be a positive number of seconds, got {}",
                    key, value
                )));
            }
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.trim().is_empty() {
                return Err(AgentError::config("service names must not be empty"));
            }
            if !seen.insert(service.as_str()) {
                return Err(AgentError::config(format!(
                    "service '{}' is listed more than once",
                    service
                )));
            }
        }

        Ok(())
    }

    /// Apply positional command-line overrides
    pub fn apply_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Path the configuration is read from when none is given explicitly
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgentError::config("Could not determine config directory"))?;

        Ok(config_dir.join("hostpulse").join("config.json"))
    }

    /// Resolve the effective configuration path
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Ok(PathBuf::from(path)),
                None => Self::default_path(),
            },
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs_f64(self.interval),
            ttl: Duration::from_secs_f64(self.ttl),
            sample_timeout: Duration::from_secs_f64(self.sample_timeout),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn config_message(error: &AgentError) -> String {
    match error {
        AgentError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}
