//! Error types for gexpin
//!
//! All modules use `GexpinResult<T>` as their return type.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for gexpin operations
pub type GexpinResult<T> = Result<T, GexpinError>;

/// All errors that can occur in gexpin
#[derive(Error, Debug)]
pub enum GexpinError {
    // Input errors
    #[error("pin requests must use POST")]
    MethodNotAllowed,

    #[error("not a github url!")]
    NotGithubUrl,

    #[error("github url has no repository path")]
    EmptyRepoPath,

    // Resolution errors
    #[error("resolving {url}: {reason}")]
    Resolution { url: String, reason: String },

    #[error("malformed metadata in {url}: expected 2 fields, found {found}")]
    MalformedMetadata { url: String, found: usize },

    // Storage node errors
    #[error("ipfs {operation} failed: {reason}")]
    Storage { operation: String, reason: String },

    #[error("ipfs {operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    // Persistence errors
    #[error("writing log file: {0}")]
    AuditWrite(#[source] std::io::Error),

    #[error("Failed to open pin log {path}: {source}")]
    AuditOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Startup errors
    #[error("error getting external ip: {0}")]
    ExternalIp(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigValue { key: String, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Category of a failure, which decides how the caller sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request or wrong method
    Input,
    /// Metadata fetch or parse failure
    Resolution,
    /// Enumeration or pin failure on the storage node
    Storage,
    /// Audit log write failure
    Persistence,
    /// Everything else (startup, config, internal)
    Other,
}

impl GexpinError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a resolution error for the given metadata url
    pub fn resolution(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolution {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage node error
    pub fn storage(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotAllowed | Self::NotGithubUrl | Self::EmptyRepoPath => ErrorKind::Input,
            Self::Resolution { .. } | Self::MalformedMetadata { .. } => ErrorKind::Resolution,
            Self::Storage { .. } | Self::Timeout { .. } => ErrorKind::Storage,
            Self::AuditWrite(_) => ErrorKind::Persistence,
            _ => ErrorKind::Other,
        }
    }

    /// HTTP status code used when this error is returned to a caller
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 403,
            _ => match self.kind() {
                ErrorKind::Input | ErrorKind::Resolution => 400,
                ErrorKind::Storage | ErrorKind::Persistence | ErrorKind::Other => 500,
            },
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ExternalIp(_) => {
                Some("Set network.external_ip in the config to skip the lookup")
            }
            Self::Storage { .. } => Some("Is the IPFS daemon running? Try: ipfs daemon"),
            Self::Bind { .. } => Some("Pick another address with: gexpin serve --listen"),
            Self::AuditOpen { .. } => Some("Check pin.log_path in the config"),
            _ => None,
        }
    }
}
