//! Pinned package records and GitHub url normalization

use crate::error::{GexpinError, GexpinResult};
use serde::{Deserialize, Serialize};

const GITHUB_PREFIX: &str = "github.com/";

/// A package that has been pinned and logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Normalized source path (`owner/repo`)
    #[serde(rename = "Url")]
    pub url: String,

    /// Root content identifier
    #[serde(rename = "Hash")]
    pub hash: String,

    /// Published version string
    #[serde(rename = "Version")]
    pub version: String,
}

impl PackageRecord {
    pub fn new(url: impl Into<String>, hash: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hash: hash.into(),
            version: version.into(),
        }
    }

    /// Audit log line, without the trailing newline
    pub fn log_line(&self) -> String {
        format!("{} {} {}", self.url, self.hash, self.version)
    }
}

/// Normalize a submitted GitHub url into its `owner/repo` path.
///
/// The first `http://` and then the first `https://` are removed, after
/// which the input must start with `github.com/`.
pub fn normalize_github_url(raw: &str) -> GexpinResult<String> {
    let stripped = raw.replacen("http://", "", 1).replacen("https://", "", 1);

    let path = stripped
        .strip_prefix(GITHUB_PREFIX)
        .ok_or(GexpinError::NotGithubUrl)?;

    if path.is_empty() {
        return Err(GexpinError::EmptyRepoPath);
    }

    Ok(path.to_string())
}
