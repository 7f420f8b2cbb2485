//! Resolves a GitHub repository to its last published gx version
//!
//! gx writes `<version> <hash>` to `.gx/lastpubver` on every publish; the
//! resolver fetches that file from the repository's raw-content host.

use crate::config::schema::ResolverConfig;
use crate::error::{GexpinError, GexpinResult};
use std::time::Duration;
use tracing::debug;

/// Version and root hash published by a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub version: String,
    pub hash: String,
}

/// Fetches and parses `lastpubver` files
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: reqwest::Client,
    raw_base_url: String,
    branch: String,
    metadata_path: String,
    timeout: Option<Duration>,
}

impl VersionResolver {
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            branch: config.branch.clone(),
            metadata_path: config.metadata_path.trim_start_matches('/').to_string(),
            timeout: config.fetch_timeout(),
        }
    }

    /// Raw-content url of the metadata file for `owner/repo`
    pub fn metadata_url(&self, repo: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.raw_base_url, repo, self.branch, self.metadata_path
        )
    }

    /// Fetch and parse the metadata file for `owner/repo`
    pub async fn resolve(&self, repo: &str) -> GexpinResult<Resolved> {
        let url = self.metadata_url(repo);
        debug!("Fetching {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let body = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GexpinError::resolution(&url, e))?
            .text()
            .await
            .map_err(|e| GexpinError::resolution(&url, e))?;

        parse_lastpubver(&body).ok_or_else(|| GexpinError::MalformedMetadata {
            url,
            found: body.split_whitespace().count(),
        })
    }
}

/// Parse `<version> <hash>`; any other field count is rejected
pub fn parse_lastpubver(body: &str) -> Option<Resolved> {
    let mut fields = body.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(version), Some(hash), None) => Some(Resolved {
            version: version.to_string(),
            hash: hash.to_string(),
        }),
        _ => None,
    }
}
