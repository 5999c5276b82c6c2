//! Service status queries through the host's service manager.
//!
//! Unix hosts ask `systemctl`, Windows hosts ask `sc`. A service that does
//! not exist, or a service manager that cannot be reached, is reported as
//! [`ServiceStatus::Unknown`] with a description rather than as a failure.

use std::process::Command;

use crate::core::health::{MetricSource, Reading, ServiceStatus, Unavailable};

/// Source reporting the status of one named service
pub struct ServiceQuery {
    name: String,
}

impl ServiceQuery {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl MetricSource for ServiceQuery {
    type Value = ServiceStatus;

    fn read(&mut self) -> Result<Reading<ServiceStatus>, Unavailable> {
        Ok(match query_service_manager(&self.name) {
            Ok(status) => Reading::new(
                format!("service {} is {}", self.name, status.as_str()),
                status,
            ),
            Err(reason) => Reading::new(
                format!("service {} status unknown: {}", self.name, reason),
                ServiceStatus::Unknown,
            ),
        })
    }
}

#[cfg(unix)]
fn query_service_manager(name: &str) -> std::result::Result<ServiceStatus, String> {
    let output = Command::new("systemctl")
        .args(["show", "--property=LoadState", "--property=ActiveState", "--"])
        .arg(name)
        .output()
        .map_err(|e| format!("systemctl unavailable ({})", e))?;

    match parse_systemctl_show(&String::from_utf8_lossy(&output.stdout)) {
        ServiceStatus::Unknown => Err("no such service".to_string()),
        status => Ok(status),
    }
}

#[cfg(windows)]
fn query_service_manager(name: &str) -> std::result::Result<ServiceStatus, String> {
    let output = Command::new("sc")
        .args(["query", name])
        .output()
        .map_err(|e| format!("sc unavailable ({})", e))?;

    match parse_sc_query(&String::from_utf8_lossy(&output.stdout)) {
        ServiceStatus::Unknown => Err("no such service".to_string()),
        status => Ok(status),
    }
}

#[cfg(not(any(unix, windows)))]
fn query_service_manager(_name: &str) -> std::result::Result<ServiceStatus, String> {
    Err("no supported service manager".to_string())
}

/// Parse `systemctl show --property=LoadState --property=ActiveState` output
pub fn parse_systemctl_show(output: &str) -> ServiceStatus {
    let mut load_state = None;
    let mut active_state = None;
    for line in output.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            match key {
                "LoadState" => load_state = Some(value),
                "ActiveState" => active_state = Some(value),
                _ => {}
            }
        }
    }

    if matches!(load_state, None | Some("not-found")) {
        return ServiceStatus::Unknown;
    }

    match active_state {
        Some("active") => ServiceStatus::Running,
        Some("inactive") | Some("failed") => ServiceStatus::Stopped,
        Some("activating") | Some("deactivating") | Some("reloading") | Some("refreshing") => {
            ServiceStatus::Transitioning
        }
        _ => ServiceStatus::Unknown,
    }
}

/// Parse `sc query <name>` output
pub fn parse_sc_query(output: &str) -> ServiceStatus {
    // FAILED 1060: The specified service does not exist as an installed service.
    if output.contains("1060") {
        return ServiceStatus::Unknown;
    }

    let code = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("STATE"))
        .filter_map(|rest| rest.trim_start().strip_prefix(':'))
        .find_map(|rest| rest.split_whitespace().next()?.parse::<u32>().ok());

    match code {
        Some(1) => ServiceStatus::Stopped,
        Some(2) | Some(3) | Some(5) | Some(6) => ServiceStatus::Transitioning,
        Some(4) => ServiceStatus::Running,
        Some(7) => ServiceStatus::Paused,
        _ => ServiceStatus::Unknown,
    }
}
