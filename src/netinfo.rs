//! Public address discovery for /node_addr

use crate::config::schema::NetworkConfig;
use crate::error::{GexpinError, GexpinResult};
use tracing::info;

/// Ask a plain-text "what is my ip" service for this host's public address
pub async fn lookup_external_ip(client: &reqwest::Client, url: &str) -> GexpinResult<String> {
    let body = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| GexpinError::ExternalIp(e.to_string()))?
        .text()
        .await
        .map_err(|e| GexpinError::ExternalIp(e.to_string()))?;

    let ip = body.trim();
    if ip.is_empty() {
        return Err(GexpinError::ExternalIp(format!("{url} returned an empty body")));
    }
    Ok(ip.to_string())
}

/// The configured override, or a lookup against `external_ip_url`
pub async fn external_ip(client: &reqwest::Client, config: &NetworkConfig) -> GexpinResult<String> {
    if let Some(ip) = config.external_ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()) {
        info!("Using configured external ip {}", ip);
        return Ok(ip.to_string());
    }

    let ip = lookup_external_ip(client, &config.external_ip_url).await?;
    info!("Discovered external ip {}", ip);
    Ok(ip)
}

/// Multiaddress peers can dial to reach the node
pub fn node_multiaddr(ip: &str, swarm_port: u16, peer_id: &str) -> String {
    format!("/ip4/{ip}/tcp/{swarm_port}/ipfs/{peer_id}")
}
