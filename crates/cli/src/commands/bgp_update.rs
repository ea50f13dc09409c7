//! `bgp-update`: reconcile BGP configuration on the management switch
//! pair against the SLS network layout.

use std::process::ExitCode;

use anyhow::{bail, Context as _};
use ridgeline_client::sls::SlsClient;
use ridgeline_client::switch::SwitchClient;
use ridgeline_core::bgp::{self, BgpPlan, FirmwareGen, NeighborPlan};

#[derive(Debug, clap::Args)]
pub struct BgpUpdateArgs {
    /// NMN address of the first switch (also used as its BGP router ID).
    pub switch1: String,
    /// NMN address of the second switch.
    pub switch2: String,
    /// Switch administrator user.
    #[arg(long, default_value = "admin")]
    pub username: String,
}

pub async fn run(args: BgpUpdateArgs) -> anyhow::Result<ExitCode> {
    let password = inquire::Password::new("Switch Password:")
        .without_confirmation()
        .prompt()
        .context("reading switch password")?;

    let (config, token) = super::authenticate().await?;
    let sls = SlsClient::new(&config, token);
    let networks = sls
        .networks()
        .await
        .context("fetching networks from SLS")?;

    let prefixes = bgp::extract_prefixes(&networks).context("deriving advertised prefixes")?;
    println!("CAN prefix:  {}", prefixes.can);
    println!("HMN prefix:  {}", prefixes.hmn);
    println!("NMN prefix:  {}", prefixes.nmn);
    println!("TFTP prefix: {}", prefixes.tftp);

    let workers = bgp::worker_ncns(&networks).context("collecting worker NCNs")?;
    println!(
        "Worker NCNs: {}",
        workers
            .iter()
            .map(|w| w.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let plan = bgp::build_plan(&prefixes, &workers);

    let switches = [
        (args.switch1.as_str(), args.switch2.as_str()),
        (args.switch2.as_str(), args.switch1.as_str()),
    ];
    for (address, peer) in switches {
        apply_switch(&plan, address, peer, &args.username, &password)
            .await
            .with_context(|| format!("configuring switch {address}"))?;
    }

    println!();
    println!(
        "BGP configuration updated on {}, please log into the switches and verify the configuration.",
        [args.switch1.as_str(), args.switch2.as_str()].join(", ")
    );
    println!("The BGP process may need to be restarted on the switches for all sessions to become ESTABLISHED.");

    Ok(ExitCode::SUCCESS)
}

/// Reset and reapply the plan on one switch.
async fn apply_switch(
    plan: &BgpPlan,
    address: &str,
    peer: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let switch = SwitchClient::connect(address)?;
    switch
        .login(username, password)
        .await
        .context("switch login failed; verify the switch address and password")?;

    // Idempotent reset: drop the BGP router and every prefix list and
    // route map before rebuilding. A missing router is not an error.
    if let Err(error) = switch.delete_bgp_router(plan.asn).await {
        tracing::debug!(switch = address, %error, "No existing BGP router to remove");
    }
    for name in switch.prefix_lists().await.context("listing prefix lists")? {
        tracing::info!(switch = address, prefix_list = %name, "Removing prefix list");
        switch.delete_prefix_list(&name).await?;
    }
    for name in switch.route_maps().await.context("listing route maps")? {
        tracing::info!(switch = address, route_map = %name, "Removing route map");
        switch.delete_route_map(&name).await?;
    }

    tracing::info!(switch = address, "Adding prefix lists");
    for list in &plan.prefix_lists {
        switch
            .create_prefix_list(&bgp::PrefixListBody {
                address_family: "ipv4",
                name: list.name.clone(),
            })
            .await?;
        for entry in &list.entries {
            switch.create_prefix_list_entry(&list.name, entry).await?;
        }
    }

    tracing::info!(switch = address, "Adding route maps");
    for map in &plan.route_maps {
        switch.create_route_map(&map.name).await?;
        for entry in &map.entries {
            switch.create_route_map_entry(&map.name, entry).await?;
        }
    }

    tracing::info!(switch = address, "Adding BGP configuration");
    switch.create_bgp_router(&plan.router_body(address)).await?;

    let version = switch
        .firmware_version()
        .await
        .context("reading switch firmware version")?;
    let Some(firmware) = FirmwareGen::from_version(&version) else {
        bail!("unsupported switch firmware {version}; expected a 10.05 or 10.06 release");
    };

    for neighbor in &plan.neighbors {
        switch
            .create_bgp_neighbor(plan.asn, &neighbor.body(plan.asn, firmware))
            .await?;
    }
    switch
        .create_bgp_neighbor(plan.asn, &NeighborPlan::vsx_peer(peer).body(plan.asn, firmware))
        .await?;

    switch.save_config().await.context("saving configuration")?;
    println!("Configuration saved on {address}");

    if let Err(error) = switch.logout().await {
        tracing::debug!(switch = address, %error, "Switch logout failed");
    }
    Ok(())
}
