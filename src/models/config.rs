use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network interface preselected for capture
    pub interface: Option<String>,

    /// Port for the REST API server
    pub port: u16,

    /// Enable promiscuous mode
    pub promiscuous: bool,

    /// BPF filter expression
    pub filter: Option<String>,
}

/// Settings handed to the capture backend when a session starts.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Enable promiscuous mode
    pub promiscuous: bool,

    /// BPF filter expression (failures to apply are logged, not fatal)
    pub filter: Option<String>,

    /// Snapshot length for captured packets
    pub snaplen: i32,

    /// Read timeout for the capture handle, in milliseconds. The engine
    /// checks its stop flag between reads, so this bounds shutdown latency.
    pub read_timeout_ms: i32,

    /// Bound on opening the capture device
    pub start_timeout: Duration,

    /// Bound on joining the engine task during stop
    pub stop_timeout: Duration,

    /// Minimum spacing between pushed traffic events
    pub event_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            promiscuous: false,
            filter: None,
            snaplen: 65535,
            read_timeout_ms: 1000,
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(2),
            event_interval: Duration::from_secs(1),
        }
    }
}

impl AppConfig {
    /// Derive the per-session capture settings from the application config.
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            promiscuous: self.promiscuous,
            filter: self.filter.clone(),
            ..CaptureConfig::default()
        }
    }
}
