//! Configuration management for gexpin

pub mod schema;

pub use schema::Config;

use crate::error::{GexpinError, GexpinResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, loads and writes the config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use `path`, or `<config dir>/gexpin/config.toml` when none is given
    pub fn new(path: Option<PathBuf>) -> Self {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gexpin")
                .join("config.toml")
        });
        Self { config_path }
    }

    /// Load the config; a missing file means all defaults
    pub async fn load(&self) -> GexpinResult<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.config_path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                let context = format!("reading config from {}", self.config_path.display());
                return Err(GexpinError::io(context, e));
            }
        };

        toml::from_str(&content).map_err(|e| GexpinError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, creating the parent directory if needed
    pub async fn save(&self, config: &Config) -> GexpinResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| GexpinError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        fs::write(&self.config_path, toml::to_string_pretty(config)?)
            .await
            .map_err(|e| {
                let context = format!("writing config to {}", self.config_path.display());
                GexpinError::io(context, e)
            })?;

        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
