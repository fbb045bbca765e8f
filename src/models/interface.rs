use serde::{Deserialize, Serialize};

/// Detailed information about a network interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInfo {
    /// Device system name (used for capture operations)
    pub name: String,

    /// Interface description, where the platform provides one
    pub description: Option<String>,

    /// IPv4 address (if available)
    pub ipv4_address: Option<String>,

    /// MAC address (if available)
    pub mac_address: Option<String>,

    /// Whether this is a loopback interface
    pub is_loopback: bool,

    /// Whether this interface is up/active
    pub is_up: bool,
}

impl InterfaceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ipv4_address: None,
            mac_address: None,
            is_loopback: false,
            is_up: true,
        }
    }

    /// Interface name with its IPv4 address appended, for display
    pub fn formatted_display(&self) -> String {
        match &self.ipv4_address {
            Some(ip) => format!("{} ({})", self.name, ip),
            None => self.name.clone(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}
