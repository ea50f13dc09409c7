//! Subcommand implementations.

use anyhow::Context as _;
use ridgeline_client::auth::{self, TokenClient};
use ridgeline_client::config::GatewayConfig;

pub mod bgp_update;
pub mod dns_records;
pub mod endpoint_fixup;
pub mod lock_nodes;
pub mod verify_discovery;

/// Gateway config plus a fresh bearer token -- the opening move of
/// every subcommand that talks through the gateway.
pub(crate) async fn authenticate() -> anyhow::Result<(GatewayConfig, String)> {
    let config = GatewayConfig::from_env();
    let secret = auth::client_secret()
        .await
        .context("obtaining admin client secret")?;
    let token = TokenClient::new(&config)
        .fetch_token(&secret)
        .await
        .context("obtaining bearer token")?;
    Ok((config, token))
}
