//! `lock-nodes`: lock management nodes that are not already locked.

use std::process::ExitCode;

use anyhow::Context as _;
use ridgeline_client::hsm::HsmClient;
use ridgeline_core::hsm::LockRequest;
use ridgeline_core::locking;

pub async fn run() -> anyhow::Result<ExitCode> {
    let (config, token) = super::authenticate().await?;
    let hsm = HsmClient::new(&config, token);

    let management_nodes = hsm
        .components(&[("type", "Node"), ("role", "Management")])
        .await
        .context("fetching management nodes from HSM")?;

    let to_lock = locking::unlocked_ids(&management_nodes);
    if to_lock.is_empty() {
        println!("No Management Nodes to Lock");
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(count = to_lock.len(), "Locking management nodes");
    let response = hsm
        .lock_components(&LockRequest::flexible(to_lock.clone()))
        .await
        .context("locking management nodes")?;

    print!(
        "{}",
        locking::render_summary(&management_nodes, &to_lock, &response)
    );

    Ok(if response.counts.failure > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
