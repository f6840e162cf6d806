//! Proxy connection settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::protocol::constants::{DOCK_PRODUCT_ID, DOCK_VENDOR_ID};

/// Settings for opening the hub proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// USB Vendor ID of the hub.
    pub vid: u16,
    /// USB Product ID of the hub EC endpoint.
    pub pid: u16,
    /// Seconds to keep polling for the hub before giving up.
    pub retry_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            vid: DOCK_VENDOR_ID,
            pid: DOCK_PRODUCT_ID,
            retry_timeout_secs: 60,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProxyConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
