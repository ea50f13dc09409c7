//! `verify-discovery`: reconcile the three hardware inventories.

use std::process::ExitCode;

use anyhow::Context as _;
use ridgeline_client::hsm::HsmClient;
use ridgeline_client::sls::SlsClient;
use ridgeline_core::discovery;

pub async fn run() -> anyhow::Result<ExitCode> {
    let (config, token) = super::authenticate().await?;

    let hsm = HsmClient::new(&config, token.clone());
    let sls = SlsClient::new(&config, token);

    let components = hsm
        .components(&[])
        .await
        .context("fetching HSM state components")?;
    let endpoints = hsm
        .redfish_endpoints(&[])
        .await
        .context("fetching HSM Redfish endpoints")?;
    let hardware = sls.hardware().await.context("fetching SLS hardware dump")?;

    let report = discovery::verify(&hardware, &components, &endpoints);
    print!("{}", report.render());

    let failures = report.failure_count();
    if failures > 0 {
        tracing::error!(failures, "Discovery verification found failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
