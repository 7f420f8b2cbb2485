//! Process-wide service state
//!
//! Built once at startup and shared with every request handler.

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::{GexpinError, GexpinResult};
use crate::netinfo;
use crate::pin::{PinService, PinTimeouts};
use crate::resolver::VersionResolver;
use crate::storage::{IpfsClient, StorageNode};
use std::sync::Arc;
use tracing::info;

const USER_AGENT: &str = concat!("gexpin/", env!("CARGO_PKG_VERSION"));

/// Everything a request handler needs
pub struct Gateway {
    pins: Arc<PinService>,
    storage: Arc<dyn StorageNode>,
    external_ip: String,
    swarm_port: u16,
}

impl Gateway {
    pub fn new(
        pins: Arc<PinService>,
        storage: Arc<dyn StorageNode>,
        external_ip: impl Into<String>,
        swarm_port: u16,
    ) -> Self {
        Self {
            pins,
            storage,
            external_ip: external_ip.into(),
            swarm_port,
        }
    }

    /// Open the pin log, discover the public ip and connect to the daemon.
    ///
    /// Any failure here is fatal for the process.
    pub async fn start(config: &Config) -> GexpinResult<Self> {
        let client = http_client()?;

        let audit = AuditLog::open(&config.pin.log_path).await?;
        let external_ip = netinfo::external_ip(&client, &config.network).await?;

        let storage: Arc<dyn StorageNode> =
            Arc::new(IpfsClient::new(client.clone(), &config.ipfs.api_url));
        let resolver = VersionResolver::new(client, &config.resolver);
        let timeouts = PinTimeouts {
            fetch: config.resolver.fetch_timeout(),
            pin: config.pin.pin_timeout(),
        };

        info!(
            "Pinning via {} (log: {})",
            config.ipfs.api_url,
            audit.path().display()
        );

        let pins = Arc::new(PinService::new(
            resolver,
            Arc::clone(&storage),
            audit,
            timeouts,
        ));
        Ok(Self::new(pins, storage, external_ip, config.ipfs.swarm_port))
    }

    pub fn pins(&self) -> &Arc<PinService> {
        &self.pins
    }

    /// Human-readable liveness of the daemon
    pub async fn status_message(&self) -> &'static str {
        if self.storage.is_up().await {
            "gexpin ipfs daemon is online!"
        } else {
            "gexpin ipfs daemon appears to be down"
        }
    }

    /// Multiaddress of the daemon as reachable from outside
    pub async fn node_addr(&self) -> GexpinResult<String> {
        let peer_id = self.storage.id().await?;
        Ok(netinfo::node_multiaddr(
            &self.external_ip,
            self.swarm_port,
            &peer_id,
        ))
    }
}

/// Shared HTTP client for every upstream call
pub fn http_client() -> GexpinResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| GexpinError::Internal(format!("building http client: {e}")))
}
