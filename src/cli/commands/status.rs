//! Status command - check the IPFS daemon the gateway would pin to

use crate::config::Config;
use crate::error::GexpinResult;
use crate::gateway::http_client;
use crate::storage::{IpfsClient, StorageNode};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> GexpinResult<()> {
    println!("{}", style("gexpin Status").bold().cyan());
    println!();

    println!("{}", style("IPFS daemon:").bold());
    println!("  API: {}", config.ipfs.api_url);

    let client = IpfsClient::new(http_client()?, &config.ipfs.api_url);
    match client.id().await {
        Ok(peer_id) => {
            println!("  {} {}", CHECK, style("Online").green());
            println!("  {} Peer ID: {}", CHECK, peer_id);
        }
        Err(e) => {
            println!(
                "  {} {} - {}",
                CROSS,
                style("Appears to be down").red(),
                e
            );
            println!("    Start it with: ipfs daemon");
        }
    }

    println!();
    println!("{}", style("Pinning:").bold());
    println!("  Pin log: {}", config.pin.log_path.display());
    println!(
        "  Metadata: {}/<owner>/<repo>/{}/{}",
        config.resolver.raw_base_url.trim_end_matches('/'),
        config.resolver.branch,
        config.resolver.metadata_path
    );

    Ok(())
}
