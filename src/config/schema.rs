//! Configuration schema for gexpin
//!
//! Configuration is stored at `~/.config/gexpin/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// IPFS daemon settings
    pub ipfs: IpfsConfig,

    /// lastpubver resolution settings
    pub resolver: ResolverConfig,

    /// Pin workflow settings
    pub pin: PinConfig,

    /// External address discovery
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen: String,

    /// Directory served for every path not handled by the API
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9444".to_string(),
            static_dir: PathBuf::from("."),
        }
    }
}

/// IPFS daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Base URL of the daemon's HTTP API
    pub api_url: String,

    /// Swarm port advertised in /node_addr
    pub swarm_port: u16,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5001".to_string(),
            swarm_port: 4001,
        }
    }
}

/// Version resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Raw-content host the metadata file is fetched from
    pub raw_base_url: String,

    /// Branch holding the metadata file
    pub branch: String,

    /// Path of the metadata file inside the repository
    pub metadata_path: String,

    /// Bound on the metadata fetch and on reference enumeration (unset = no bound)
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            branch: "master".to_string(),
            metadata_path: ".gx/lastpubver".to_string(),
            fetch_timeout_secs: None,
        }
    }
}

impl ResolverConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

/// Pin workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Append-only log of completed pins
    pub log_path: PathBuf,

    /// Bound on the pin call (unset = no bound)
    pub pin_timeout_secs: Option<u64>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("pinlogs"),
            pin_timeout_secs: None,
        }
    }
}

impl PinConfig {
    pub fn pin_timeout(&self) -> Option<Duration> {
        self.pin_timeout_secs.map(Duration::from_secs)
    }
}

/// External address discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Service returning the caller's public IP as plain text
    pub external_ip_url: String,

    /// Fixed public IP; skips the lookup when set
    pub external_ip: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            external_ip_url: "https://api.ipify.org".to_string(),
            external_ip: None,
        }
    }
}
