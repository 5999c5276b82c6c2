// Platform-specific code module

pub mod sensors;
pub mod services;

// Re-exports for cleaner imports
pub use sensors::SysinfoSources;
pub use services::{parse_sc_query, parse_systemctl_show, ServiceQuery};
