//! IPFS daemon client over the HTTP RPC API (`/api/v0`)

use super::{RefStream, StorageNode};
use crate::error::{GexpinError, GexpinResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

/// Client for a local or remote IPFS daemon
#[derive(Debug, Clone)]
pub struct IpfsClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RefLine {
    #[serde(rename = "Ref", default)]
    reference: String,
    #[serde(rename = "Err", default)]
    err: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "Message")]
    message: String,
}

impl IpfsClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn call(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> GexpinResult<reqwest::Response> {
        let url = format!("{}/api/v0/{}", self.api_url, endpoint);
        debug!("POST {} {:?}", url, query);

        let response = self
            .client
            .post(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GexpinError::storage(endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The daemon reports failures as {"Message": ..., "Code": ..., "Type": "error"}
        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| format!("{}: {}", status, body.trim()));
        Err(GexpinError::storage(endpoint, reason))
    }
}

#[async_trait]
impl StorageNode for IpfsClient {
    async fn is_up(&self) -> bool {
        match self.id().await {
            Ok(_) => true,
            Err(e) => {
                warn!("IPFS daemon liveness probe failed: {}", e);
                false
            }
        }
    }

    async fn id(&self) -> GexpinResult<String> {
        let response = self.call("id", &[]).await?;
        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| GexpinError::storage("id", e))?;
        Ok(body.id)
    }

    async fn refs(&self, hash: &str) -> GexpinResult<RefStream> {
        let response = self
            .call("refs", &[("arg", hash), ("recursive", "true")])
            .await?;
        let mut body = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut buf: Vec<u8> = Vec::new();
            loop {
                let chunk = match body.next().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(e)) => {
                        yield Err(GexpinError::storage("refs", e));
                        return;
                    }
                    None => break,
                };
                buf.extend_from_slice(&chunk);

                while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    match parse_ref_line(&line) {
                        Ok(Some(reference)) => yield Ok(reference),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            match parse_ref_line(&buf) {
                Ok(Some(reference)) => yield Ok(reference),
                Ok(None) => {}
                Err(e) => yield Err(e),
            }
        };

        Ok(stream.boxed())
    }

    async fn pin(&self, hash: &str) -> GexpinResult<()> {
        let response = self
            .call("pin/add", &[("arg", hash), ("recursive", "true")])
            .await?;
        // Drain the body so a failure reported mid-response still surfaces
        response
            .bytes()
            .await
            .map_err(|e| GexpinError::storage("pin/add", e))?;
        Ok(())
    }
}

/// Parse one NDJSON line of `refs` output. Blank lines yield `None`.
fn parse_ref_line(line: &[u8]) -> GexpinResult<Option<String>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let parsed: RefLine =
        serde_json::from_str(text).map_err(|e| GexpinError::storage("refs", e))?;
    if !parsed.err.is_empty() {
        return Err(GexpinError::storage("refs", parsed.err));
    }
    Ok(Some(parsed.reference))
}
