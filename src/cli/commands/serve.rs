//! Serve command - run the pinning gateway

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::{GexpinError, GexpinResult};
use crate::gateway::Gateway;
use crate::server;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> GexpinResult<()> {
    let config = apply_overrides(config.clone(), args);
    let addr = parse_listen(&config.server.listen)?;

    let gateway = Arc::new(Gateway::start(&config).await?);
    debug!("Serving static files from {}", config.server.static_dir.display());

    let router = server::router(gateway, &config.server.static_dir);
    server::serve(router, addr).await
}

/// Command-line flags take precedence over the config file
fn apply_overrides(mut config: Config, args: ServeArgs) -> Config {
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(api) = args.ipfs_api {
        config.ipfs.api_url = api;
    }
    if let Some(path) = args.log_path {
        config.pin.log_path = path;
    }
    if let Some(dir) = args.static_dir {
        config.server.static_dir = dir;
    }
    config
}

fn parse_listen(listen: &str) -> GexpinResult<SocketAddr> {
    listen.parse().map_err(|e| GexpinError::ConfigValue {
        key: "server.listen".to_string(),
        reason: format!("{listen:?}: {e}"),
    })
}
